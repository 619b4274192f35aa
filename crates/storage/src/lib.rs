// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Redis storage shared by the heads of a cluster

mod channel;
mod delayed;
mod error;
pub mod keys;
mod store;

pub use channel::{subscribe, RedisHeadChannel, RedisSubscription};
pub use delayed::RedisDelayedFeedbackManager;
pub use error::RedisStoreError;
pub use store::RedisCampaignStore;

use redis::aio::ConnectionManager;

/// Open a reconnecting connection to the Redis server at `url`
pub async fn connect(url: &str) -> Result<ConnectionManager, RedisStoreError> {
    let client = redis::Client::open(url)?;
    Ok(ConnectionManager::new(client).await?)
}
