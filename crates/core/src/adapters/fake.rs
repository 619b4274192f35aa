// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fakes of the collaborators for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::traits::{
    CampaignReportStateKeeper, CampaignService, ChannelError, DelayedFeedbackManager,
    FactoryHealth, FactoryService, FactoryState, FeedbackHeadChannel, HeadChannel,
    ReportPublisher, ServiceError,
};
use crate::campaign::{Campaign, ExecutionStatus, NodeId, ScenarioName};
use crate::directive::Directive;
use crate::feedback::Feedback;
use crate::report::CampaignReport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn record<T>(calls: &Mutex<Vec<T>>, call: T) {
    calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
}

fn snapshot<T: Clone>(calls: &Mutex<Vec<T>>) -> Vec<T> {
    calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

// =============================================================================
// Campaign service
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CampaignCall {
    Close {
        tenant: String,
        campaign_key: String,
        status: ExecutionStatus,
        message: Option<String>,
    },
    CloseScenario {
        tenant: String,
        campaign_key: String,
        scenario: String,
    },
    Abort {
        tenant: String,
        aborter: String,
        campaign_key: String,
    },
}

#[derive(Clone, Default)]
pub struct FakeCampaignService {
    calls: Arc<Mutex<Vec<CampaignCall>>>,
}

impl FakeCampaignService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<CampaignCall> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl CampaignService for FakeCampaignService {
    async fn close(
        &self,
        tenant: &str,
        campaign_key: &str,
        status: ExecutionStatus,
        message: Option<&str>,
    ) -> Result<(), ServiceError> {
        record(
            &self.calls,
            CampaignCall::Close {
                tenant: tenant.to_string(),
                campaign_key: campaign_key.to_string(),
                status,
                message: message.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn close_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<(), ServiceError> {
        record(
            &self.calls,
            CampaignCall::CloseScenario {
                tenant: tenant.to_string(),
                campaign_key: campaign_key.to_string(),
                scenario: scenario.to_string(),
            },
        );
        Ok(())
    }

    async fn abort(
        &self,
        tenant: &str,
        aborter: &str,
        campaign_key: &str,
    ) -> Result<(), ServiceError> {
        record(
            &self.calls,
            CampaignCall::Abort {
                tenant: tenant.to_string(),
                aborter: aborter.to_string(),
                campaign_key: campaign_key.to_string(),
            },
        );
        Ok(())
    }
}

// =============================================================================
// Factory service
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FactoryCall {
    Release {
        campaign_key: String,
        node_ids: Vec<NodeId>,
    },
    Health {
        tenant: String,
        node_ids: Vec<NodeId>,
    },
}

/// Factories are reported IDLE unless another state was set
#[derive(Clone, Default)]
pub struct FakeFactoryService {
    health: Arc<Mutex<HashMap<NodeId, FactoryState>>>,
    calls: Arc<Mutex<Vec<FactoryCall>>>,
}

impl FakeFactoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, node_id: &str, state: FactoryState) {
        self.health
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(node_id.to_string(), state);
    }

    pub fn calls(&self) -> Vec<FactoryCall> {
        snapshot(&self.calls)
    }

    /// All the nodes released so far, in call order
    pub fn released(&self) -> Vec<NodeId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FactoryCall::Release { node_ids, .. } => Some(node_ids),
                FactoryCall::Health { .. } => None,
            })
            .flatten()
            .collect()
    }
}

#[async_trait]
impl FactoryService for FakeFactoryService {
    async fn release_factories(
        &self,
        campaign: &Campaign,
        node_ids: &[NodeId],
    ) -> Result<(), ServiceError> {
        record(
            &self.calls,
            FactoryCall::Release {
                campaign_key: campaign.key.clone(),
                node_ids: node_ids.to_vec(),
            },
        );
        Ok(())
    }

    async fn get_factories_health(
        &self,
        tenant: &str,
        node_ids: &[NodeId],
    ) -> Result<Vec<FactoryHealth>, ServiceError> {
        record(
            &self.calls,
            FactoryCall::Health {
                tenant: tenant.to_string(),
                node_ids: node_ids.to_vec(),
            },
        );
        let health = self.health.lock().unwrap_or_else(|e| e.into_inner());
        Ok(node_ids
            .iter()
            .map(|node_id| FactoryHealth {
                node_id: node_id.clone(),
                state: health.get(node_id).copied().unwrap_or(FactoryState::Idle),
            })
            .collect())
    }
}

// =============================================================================
// Report state keeper and publishers
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ReportCall {
    Start {
        campaign_key: String,
        scenarios: Vec<ScenarioName>,
    },
    CompleteScenario {
        campaign_key: String,
        scenario: String,
    },
    Complete {
        campaign_key: String,
    },
    Abort {
        campaign_key: String,
    },
    GenerateReport {
        campaign_key: String,
    },
}

#[derive(Clone, Default)]
pub struct FakeReportStateKeeper {
    report: Arc<Mutex<Option<CampaignReport>>>,
    calls: Arc<Mutex<Vec<ReportCall>>>,
}

impl FakeReportStateKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report returned by `generate_report`
    pub fn set_report(&self, report: CampaignReport) {
        *self.report.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
    }

    pub fn calls(&self) -> Vec<ReportCall> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl CampaignReportStateKeeper for FakeReportStateKeeper {
    async fn start(
        &self,
        campaign_key: &str,
        scenarios: &[ScenarioName],
    ) -> Result<(), ServiceError> {
        record(
            &self.calls,
            ReportCall::Start {
                campaign_key: campaign_key.to_string(),
                scenarios: scenarios.to_vec(),
            },
        );
        Ok(())
    }

    async fn complete_scenario(
        &self,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<(), ServiceError> {
        record(
            &self.calls,
            ReportCall::CompleteScenario {
                campaign_key: campaign_key.to_string(),
                scenario: scenario.to_string(),
            },
        );
        Ok(())
    }

    async fn complete(&self, campaign_key: &str) -> Result<(), ServiceError> {
        record(
            &self.calls,
            ReportCall::Complete {
                campaign_key: campaign_key.to_string(),
            },
        );
        Ok(())
    }

    async fn abort(&self, campaign_key: &str) -> Result<(), ServiceError> {
        record(
            &self.calls,
            ReportCall::Abort {
                campaign_key: campaign_key.to_string(),
            },
        );
        Ok(())
    }

    async fn generate_report(
        &self,
        campaign_key: &str,
    ) -> Result<Option<CampaignReport>, ServiceError> {
        record(
            &self.calls,
            ReportCall::GenerateReport {
                campaign_key: campaign_key.to_string(),
            },
        );
        Ok(self.report.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeReportPublisher {
    published: Arc<Mutex<Vec<CampaignReport>>>,
    failing: bool,
}

impl FakeReportPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher rejecting every report
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<CampaignReport> {
        snapshot(&self.published)
    }
}

#[async_trait]
impl ReportPublisher for FakeReportPublisher {
    async fn publish(
        &self,
        _campaign: &Campaign,
        report: &CampaignReport,
    ) -> Result<(), ServiceError> {
        if self.failing {
            return Err(ServiceError::Unavailable("report sink is down".to_string()));
        }
        record(&self.published, report.clone());
        Ok(())
    }
}

// =============================================================================
// Channels
// =============================================================================

/// Records directives and feedbacks instead of publishing them
#[derive(Clone, Default)]
pub struct FakeHeadChannel {
    directives: Arc<Mutex<Vec<Directive>>>,
    feedbacks: Arc<Mutex<Vec<(String, Feedback)>>>,
}

impl FakeHeadChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directives(&self) -> Vec<Directive> {
        snapshot(&self.directives)
    }

    /// Return and forget the directives published so far
    pub fn take_directives(&self) -> Vec<Directive> {
        std::mem::take(&mut *self.directives.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn feedbacks(&self) -> Vec<(String, Feedback)> {
        snapshot(&self.feedbacks)
    }
}

#[async_trait]
impl HeadChannel for FakeHeadChannel {
    async fn publish_directive(&self, directive: &Directive) -> Result<(), ChannelError> {
        record(&self.directives, directive.clone());
        Ok(())
    }
}

#[async_trait]
impl FeedbackHeadChannel for FakeHeadChannel {
    async fn publish_feedback(
        &self,
        channel: &str,
        feedback: &Feedback,
    ) -> Result<(), ChannelError> {
        record(&self.feedbacks, (channel.to_string(), feedback.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledFeedback {
    pub channel: String,
    pub feedback: Feedback,
    pub delay: Duration,
}

/// Keeps scheduled feedbacks without ever publishing them
#[derive(Clone, Default)]
pub struct FakeDelayedFeedbackManager {
    scheduled: Arc<Mutex<Vec<ScheduledFeedback>>>,
}

impl FakeDelayedFeedbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<ScheduledFeedback> {
        snapshot(&self.scheduled)
    }
}

#[async_trait]
impl DelayedFeedbackManager for FakeDelayedFeedbackManager {
    async fn schedule(
        &self,
        channel: &str,
        feedback: Feedback,
        delay: Duration,
    ) -> Result<(), ChannelError> {
        record(
            &self.scheduled,
            ScheduledFeedback {
                channel: channel.to_string(),
                feedback,
                delay,
            },
        );
        Ok(())
    }
}
