// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directives and feedbacks exchanged over Redis pub/sub

use crate::error::{publish_failed, RedisStoreError};
use async_trait::async_trait;
use cm_core::{ChannelError, Directive, Feedback, FeedbackHeadChannel, HeadChannel};
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use serde::Serialize;

/// Publishes JSON messages on Redis channels
#[derive(Clone)]
pub struct RedisHeadChannel {
    connection: ConnectionManager,
}

impl RedisHeadChannel {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn publish<T: Serialize + Sync>(
        &self,
        channel: &str,
        message: &T,
    ) -> Result<(), ChannelError> {
        let payload = serde_json::to_string(message)?;
        let mut connection = self.connection.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut connection)
            .await
            .map_err(|e| publish_failed(channel, RedisStoreError::from(e)))?;
        tracing::trace!(channel, receivers, "published");
        Ok(())
    }
}

#[async_trait]
impl HeadChannel for RedisHeadChannel {
    async fn publish_directive(&self, directive: &Directive) -> Result<(), ChannelError> {
        self.publish(&directive.channel, directive).await
    }
}

#[async_trait]
impl FeedbackHeadChannel for RedisHeadChannel {
    async fn publish_feedback(
        &self,
        channel: &str,
        feedback: &Feedback,
    ) -> Result<(), ChannelError> {
        self.publish(channel, feedback).await
    }
}

/// Messages received on the subscribed channels
pub struct RedisSubscription {
    messages: BoxStream<'static, redis::Msg>,
}

impl RedisSubscription {
    /// Next message as `(channel, payload)`; `None` once the connection is closed
    pub async fn next_message(&mut self) -> Option<(String, String)> {
        loop {
            let message = self.messages.next().await?;
            let channel = message.get_channel_name().to_string();
            match message.get_payload() {
                Ok(payload) => return Some((channel, payload)),
                Err(e) => tracing::warn!(channel, error = %e, "unreadable message"),
            }
        }
    }
}

/// Subscribe to `channels` on the Redis server at `url`
pub async fn subscribe(url: &str, channels: &[String]) -> Result<RedisSubscription, RedisStoreError> {
    let client = redis::Client::open(url)?;
    let mut pubsub = client.get_async_pubsub().await?;
    for channel in channels {
        pubsub.subscribe(channel).await?;
        tracing::info!(channel, "subscribed");
    }
    Ok(RedisSubscription {
        messages: pubsub.into_on_message().boxed(),
    })
}
