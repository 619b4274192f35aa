// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! cm-core: campaign execution state machine of the heads
//!
//! This crate provides:
//! - The campaign aggregate, directives sent to factories and their feedbacks
//! - The phase state machine driving a campaign from assignment to shutdown
//! - The persistence port used to resume campaigns on any head
//! - Collaborator traits (campaign, factory and report services, channels)

pub mod clock;
pub mod id;

pub mod adapters;
pub mod campaign;
pub mod directive;
pub mod feedback;
pub mod profile;
pub mod report;
pub mod state;
pub mod store;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};

pub use campaign::{
    AbortConfiguration, Campaign, ExecutionStatus, FactoryConfiguration,
    FactoryScenarioAssignment, LaunchSequence, NodeId, ScenarioConfiguration, ScenarioName,
};
pub use directive::{Directive, DirectiveKind};
pub use feedback::{Feedback, FeedbackKind, FeedbackStatus};
pub use profile::{
    ExecutionProfile, ExecutionProfileConfiguration, ImmediateExecutionProfile,
    MinionsStartingLine, Stage, plan,
};
pub use report::{CampaignReport, ScenarioReport};
pub use state::{
    CampaignExecutionContext, CampaignExecutionState, Phase, StateError, ABORT_MESSAGE,
    DEFAULT_ABORT_GRACE_PERIOD, NO_FACTORY_MESSAGE,
};
pub use store::{
    CampaignStore, InMemoryCampaignStore, PhaseLabel, StoreError, StoredCampaign,
    UnknownPhaseLabel,
};

// Re-export adapters
pub use adapters::{
    CampaignReportStateKeeper, CampaignService, ChannelError, DelayedFeedbackManager,
    FactoryHealth, FactoryService, FactoryState, FeedbackHeadChannel, HeadChannel,
    ReportPublisher, ServiceError,
};
