// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delayed feedbacks of a head running alone

use crate::scheduler::Scheduler;
use async_trait::async_trait;
use cm_core::{ChannelError, DelayedFeedbackManager, Feedback, FeedbackHeadChannel, IdGen};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Publishes scheduled feedbacks from a background task.
///
/// Pending feedbacks are lost when the head stops.
pub struct InMemoryDelayedFeedbackManager {
    scheduler: Arc<Mutex<Scheduler>>,
    wakeup: Arc<Notify>,
    id_gen: Arc<dyn IdGen>,
    task: JoinHandle<()>,
}

impl InMemoryDelayedFeedbackManager {
    /// Start the publishing task; must be called within a tokio runtime
    pub fn new(channel: Arc<dyn FeedbackHeadChannel>, id_gen: Arc<dyn IdGen>) -> Self {
        let scheduler = Arc::new(Mutex::new(Scheduler::new()));
        let wakeup = Arc::new(Notify::new());
        let task = tokio::spawn(run(scheduler.clone(), wakeup.clone(), channel));
        Self {
            scheduler,
            wakeup,
            id_gen,
            task,
        }
    }

    /// Schedule a feedback and return the id to cancel it with
    pub fn schedule_feedback(&self, channel: &str, feedback: Feedback, delay: Duration) -> String {
        let id = self.id_gen.next();
        tracing::debug!(
            id = %id,
            campaign = %feedback.campaign_key,
            node = %feedback.node_id,
            feedback = feedback.name(),
            delay_ms = delay.as_millis() as u64,
            "feedback scheduled"
        );
        self.scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .schedule(id.clone(), Instant::now() + delay, channel, feedback);
        self.wakeup.notify_one();
        id
    }

    /// Cancel a pending feedback; returns whether it was still pending
    pub fn cancel(&self, id: &str) -> bool {
        self.scheduler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel(id)
    }

    pub fn pending(&self) -> usize {
        self.scheduler.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Drop for InMemoryDelayedFeedbackManager {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl DelayedFeedbackManager for InMemoryDelayedFeedbackManager {
    async fn schedule(
        &self,
        channel: &str,
        feedback: Feedback,
        delay: Duration,
    ) -> Result<(), ChannelError> {
        self.schedule_feedback(channel, feedback, delay);
        Ok(())
    }
}

async fn run(
    scheduler: Arc<Mutex<Scheduler>>,
    wakeup: Arc<Notify>,
    channel: Arc<dyn FeedbackHeadChannel>,
) {
    loop {
        let (ready, next) = {
            let mut scheduler = scheduler.lock().unwrap_or_else(|e| e.into_inner());
            let ready = scheduler.poll(Instant::now());
            (ready, scheduler.next_fire_time())
        };

        for item in ready {
            tracing::info!(
                id = %item.id,
                campaign = %item.feedback.campaign_key,
                node = %item.feedback.node_id,
                feedback = item.feedback.name(),
                "publishing delayed feedback"
            );
            if let Err(e) = channel.publish_feedback(&item.channel, &item.feedback).await {
                tracing::warn!(id = %item.id, error = %e, "delayed feedback not published");
            }
        }

        match next {
            Some(fire_at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(fire_at)) => {}
                    _ = wakeup.notified() => {}
                }
            }
            None => wakeup.notified().await,
        }
    }
}

#[cfg(test)]
#[path = "delayed_tests.rs"]
mod tests;
