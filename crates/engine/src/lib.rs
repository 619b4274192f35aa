// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Campaign management execution engine

mod delayed;
mod error;
mod executor;
mod loopback;
mod recovery;
mod scheduler;

pub use delayed::InMemoryDelayedFeedbackManager;
pub use error::ExecutorError;
pub use executor::{CampaignExecutor, ExecutorConfig};
pub use loopback::LoopbackFeedbackChannel;
pub use recovery::resolve;
pub use scheduler::{ScheduledItem, Scheduler};
