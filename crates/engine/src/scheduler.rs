// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer-based scheduling of delayed feedbacks

use cm_core::Feedback;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

/// A feedback waiting to be published
#[derive(Debug, Clone)]
pub struct ScheduledItem {
    pub id: String,
    pub fire_at: Instant,
    pub channel: String,
    pub feedback: Feedback,
}

impl PartialEq for ScheduledItem {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl Eq for ScheduledItem {}

impl PartialOrd for ScheduledItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first
        Reverse(self.fire_at).cmp(&Reverse(other.fire_at))
    }
}

/// Pending feedbacks ordered by fire time
#[derive(Default)]
pub struct Scheduler {
    items: BinaryHeap<ScheduledItem>,
    cancelled: HashSet<String>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a feedback for publication on `channel` at `fire_at`
    pub fn schedule(
        &mut self,
        id: impl Into<String>,
        fire_at: Instant,
        channel: impl Into<String>,
        feedback: Feedback,
    ) {
        self.items.push(ScheduledItem {
            id: id.into(),
            fire_at,
            channel: channel.into(),
            feedback,
        });
    }

    /// Cancel a scheduled item; returns whether it was still pending
    pub fn cancel(&mut self, id: &str) -> bool {
        let pending = self
            .items
            .iter()
            .any(|item| item.id == id && !self.cancelled.contains(id));
        if pending {
            self.cancelled.insert(id.to_string());
        }
        pending
    }

    /// Get all items that should fire at or before the given time
    pub fn poll(&mut self, now: Instant) -> Vec<ScheduledItem> {
        let mut ready = Vec::new();

        while let Some(item) = self.items.peek() {
            if item.fire_at > now {
                break;
            }

            let Some(item) = self.items.pop() else {
                break;
            };

            // Skip cancelled items
            if self.cancelled.remove(&item.id) {
                continue;
            }

            ready.push(item);
        }

        ready
    }

    /// Number of items still waiting, cancelled ones excluded
    pub fn len(&self) -> usize {
        self.items.len().saturating_sub(self.cancelled.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the next fire time, if any
    pub fn next_fire_time(&self) -> Option<Instant> {
        self.items.peek().map(|item| item.fire_at)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
