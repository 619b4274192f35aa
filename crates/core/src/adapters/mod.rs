// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborators consumed by the campaign state machine

pub mod traits;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use traits::{
    CampaignReportStateKeeper, CampaignService, ChannelError, DelayedFeedbackManager,
    FactoryHealth, FactoryService, FactoryState, FeedbackHeadChannel, HeadChannel,
    ReportPublisher, ServiceError,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{
    CampaignCall, FactoryCall, FakeCampaignService, FakeDelayedFeedbackManager,
    FakeFactoryService, FakeHeadChannel, FakeReportPublisher, FakeReportStateKeeper,
    ReportCall, ScheduledFeedback,
};
