// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collaborators of a head running without the surrounding services

pub mod noop;
pub mod report;
pub mod stdio;
pub mod traced;

pub use noop::{NoOpCampaignService, NoOpFactoryService};
pub use report::{InMemoryReportStateKeeper, LoggingReportPublisher};
pub use stdio::StdoutHeadChannel;
pub use traced::{TracedFactoryService, TracedHeadChannel};
