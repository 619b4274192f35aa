// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependencies shared by every execution state

use crate::adapters::{
    CampaignReportStateKeeper, CampaignService, DelayedFeedbackManager, FactoryService,
    HeadChannel, ReportPublisher,
};
use crate::clock::Clock;
use crate::store::CampaignStore;
use std::sync::Arc;
use std::time::Duration;

/// Default delay before an abort is forced through for silent factories
pub const DEFAULT_ABORT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Read-only bag of collaborators injected into the states
#[derive(Clone)]
pub struct CampaignExecutionContext {
    pub campaign_service: Arc<dyn CampaignService>,
    pub factory_service: Arc<dyn FactoryService>,
    pub report_state_keeper: Arc<dyn CampaignReportStateKeeper>,
    pub head_channel: Arc<dyn HeadChannel>,
    pub report_publishers: Vec<Arc<dyn ReportPublisher>>,
    pub store: Arc<dyn CampaignStore>,
    pub delayed_feedback_manager: Arc<dyn DelayedFeedbackManager>,
    pub clock: Arc<dyn Clock>,
    pub abort_grace_period: Duration,
}
