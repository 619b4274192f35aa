// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delayed feedbacks any head of the cluster may publish

use crate::error::{publish_failed, RedisStoreError};
use crate::keys::DELAYED_FEEDBACKS_KEY;
use async_trait::async_trait;
use cm_core::{
    ChannelError, Clock, DelayedFeedbackManager, Feedback, FeedbackHeadChannel, IdGen,
};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Entry of the sorted set, scored by its due time in epoch milliseconds
#[derive(Debug, Serialize, Deserialize)]
struct PendingFeedback {
    id: String,
    channel: String,
    feedback: Feedback,
}

/// Schedules feedbacks in a Redis sorted set polled by every head.
///
/// A due entry is published by the head whose `ZREM` claimed it, so a
/// feedback survives the loss of the head that scheduled it and is published
/// at most once.
pub struct RedisDelayedFeedbackManager {
    connection: ConnectionManager,
    channel: Arc<dyn FeedbackHeadChannel>,
    id_gen: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
}

impl RedisDelayedFeedbackManager {
    pub fn new(
        connection: ConnectionManager,
        channel: Arc<dyn FeedbackHeadChannel>,
        id_gen: Arc<dyn IdGen>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connection,
            channel,
            id_gen,
            clock,
        }
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Publish the feedbacks that are due; returns how many this head claimed
    pub async fn poll_due(&self) -> Result<usize, RedisStoreError> {
        let mut connection = self.connection.clone();
        let due: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(DELAYED_FEEDBACKS_KEY)
            .arg("-inf")
            .arg(self.now_millis())
            .query_async(&mut connection)
            .await?;

        let mut published = 0;
        for entry in due {
            let claimed: i64 = redis::cmd("ZREM")
                .arg(DELAYED_FEEDBACKS_KEY)
                .arg(&entry)
                .query_async(&mut connection)
                .await?;
            if claimed != 1 {
                // Another head took it
                continue;
            }
            let pending: PendingFeedback = match serde_json::from_str(&entry) {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unreadable delayed feedback");
                    continue;
                }
            };
            tracing::info!(
                id = %pending.id,
                campaign = %pending.feedback.campaign_key,
                node = %pending.feedback.node_id,
                feedback = pending.feedback.name(),
                "publishing delayed feedback"
            );
            if let Err(e) = self
                .channel
                .publish_feedback(&pending.channel, &pending.feedback)
                .await
            {
                tracing::warn!(id = %pending.id, error = %e, "delayed feedback not published");
                continue;
            }
            published += 1;
        }
        Ok(published)
    }

    /// Poll the due feedbacks every `interval` until the task is aborted
    pub fn spawn_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.poll_due().await {
                    tracing::warn!(error = %e, "polling delayed feedbacks failed");
                }
            }
        })
    }

    async fn add(&self, channel: &str, feedback: Feedback, delay: Duration) -> Result<(), RedisStoreError> {
        let due = due_millis(self.now_millis(), delay);
        let pending = PendingFeedback {
            id: self.id_gen.next(),
            channel: channel.to_string(),
            feedback,
        };
        let entry = serde_json::to_string(&pending)?;
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("ZADD")
            .arg(DELAYED_FEEDBACKS_KEY)
            .arg(due)
            .arg(entry)
            .query_async(&mut connection)
            .await?;
        tracing::debug!(
            id = %pending.id,
            campaign = %pending.feedback.campaign_key,
            node = %pending.feedback.node_id,
            delay_ms = delay.as_millis() as u64,
            "feedback scheduled"
        );
        Ok(())
    }
}

#[async_trait]
impl DelayedFeedbackManager for RedisDelayedFeedbackManager {
    async fn schedule(
        &self,
        channel: &str,
        feedback: Feedback,
        delay: Duration,
    ) -> Result<(), ChannelError> {
        self.add(channel, feedback, delay)
            .await
            .map_err(|e| publish_failed(DELAYED_FEEDBACKS_KEY, e))
    }
}

/// Score of a feedback due `delay` after `now_millis`, clamped to the score range
fn due_millis(now_millis: i64, delay: Duration) -> i64 {
    now_millis.saturating_add(i64::try_from(delay.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[path = "delayed_tests.rs"]
mod tests;
