// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feedbacks a head sends to itself

use async_trait::async_trait;
use cm_core::{ChannelError, Feedback, FeedbackHeadChannel};
use tokio::sync::mpsc;

/// Feeds published feedbacks straight into the head's own inbound queue
#[derive(Clone)]
pub struct LoopbackFeedbackChannel {
    sender: mpsc::UnboundedSender<Feedback>,
}

impl LoopbackFeedbackChannel {
    pub fn new(sender: mpsc::UnboundedSender<Feedback>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl FeedbackHeadChannel for LoopbackFeedbackChannel {
    async fn publish_feedback(
        &self,
        channel: &str,
        feedback: &Feedback,
    ) -> Result<(), ChannelError> {
        self.sender
            .send(feedback.clone())
            .map_err(|_| ChannelError::PublishFailed {
                channel: channel.to_string(),
                message: "the head stopped receiving feedbacks".to_string(),
            })
    }
}
