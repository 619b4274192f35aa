// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the campaign executor

use cm_core::{ChannelError, ServiceError, StateError, StoreError};
use thiserror::Error;

/// Errors that can occur while driving campaigns
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("campaign '{campaign_key}' of tenant '{tenant}' is already running")]
    AlreadyRunning { tenant: String, campaign_key: String },
    #[error("campaign '{campaign_key}' of tenant '{tenant}' is no longer running")]
    Stopped { tenant: String, campaign_key: String },
}
