// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cm_core::{ChannelError, StoreError};
use thiserror::Error;

/// Errors that can occur in Redis operations
#[derive(Debug, Error)]
pub enum RedisStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RedisStoreError> for StoreError {
    fn from(e: RedisStoreError) -> Self {
        match e {
            RedisStoreError::Redis(e) => StoreError::Backend(e.to_string()),
            RedisStoreError::Json(e) => StoreError::Serialization(e),
        }
    }
}

/// Map a Redis failure into the store error of the persistence port
pub(crate) fn backend(e: redis::RedisError) -> StoreError {
    RedisStoreError::from(e).into()
}

/// Map a Redis failure on `channel` into a channel error
pub(crate) fn publish_failed(channel: &str, e: RedisStoreError) -> ChannelError {
    match e {
        RedisStoreError::Json(e) => ChannelError::Serialization(e),
        RedisStoreError::Redis(e) => ChannelError::PublishFailed {
            channel: channel.to_string(),
            message: e.to_string(),
        },
    }
}
