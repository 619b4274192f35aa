// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator trait definitions

use crate::campaign::{Campaign, ExecutionStatus, NodeId, ScenarioName};
use crate::directive::Directive;
use crate::feedback::Feedback;
use crate::report::CampaignReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the campaign, factory and report services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),
    #[error("factory not found: {0}")]
    FactoryNotFound(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from publishing on the head channels
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("publish on {channel} failed: {message}")]
    PublishFailed { channel: String, message: String },
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Campaign bookkeeping
// =============================================================================

/// Persistent bookkeeping of campaigns
#[async_trait]
pub trait CampaignService: Send + Sync {
    /// Finalize the campaign with its terminal status
    async fn close(
        &self,
        tenant: &str,
        campaign_key: &str,
        status: ExecutionStatus,
        message: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Record the end of one scenario
    async fn close_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<(), ServiceError>;

    /// Record who aborted the campaign
    async fn abort(&self, tenant: &str, aborter: &str, campaign_key: &str)
        -> Result<(), ServiceError>;
}

// =============================================================================
// Factories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactoryState {
    Registered,
    Idle,
    Unhealthy,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryHealth {
    pub node_id: NodeId,
    pub state: FactoryState,
}

/// Registry of the factories available to the campaigns
#[async_trait]
pub trait FactoryService: Send + Sync {
    /// Detach factories from the campaign so they can serve others
    async fn release_factories(
        &self,
        campaign: &Campaign,
        node_ids: &[NodeId],
    ) -> Result<(), ServiceError>;

    async fn get_factories_health(
        &self,
        tenant: &str,
        node_ids: &[NodeId],
    ) -> Result<Vec<FactoryHealth>, ServiceError>;
}

// =============================================================================
// Reporting
// =============================================================================

/// Tracks the reporting windows of campaigns and scenarios
#[async_trait]
pub trait CampaignReportStateKeeper: Send + Sync {
    async fn start(&self, campaign_key: &str, scenarios: &[ScenarioName])
        -> Result<(), ServiceError>;

    async fn complete_scenario(
        &self,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<(), ServiceError>;

    async fn complete(&self, campaign_key: &str) -> Result<(), ServiceError>;

    async fn abort(&self, campaign_key: &str) -> Result<(), ServiceError>;

    async fn generate_report(&self, campaign_key: &str)
        -> Result<Option<CampaignReport>, ServiceError>;
}

/// Consumer of the final report of a campaign
#[async_trait]
pub trait ReportPublisher: Send + Sync {
    async fn publish(&self, campaign: &Campaign, report: &CampaignReport)
        -> Result<(), ServiceError>;
}

// =============================================================================
// Channels
// =============================================================================

/// Publishes directives to the factories
#[async_trait]
pub trait HeadChannel: Send + Sync {
    async fn publish_directive(&self, directive: &Directive) -> Result<(), ChannelError>;
}

/// Publishes feedbacks, as if a factory had sent them
#[async_trait]
pub trait FeedbackHeadChannel: Send + Sync {
    async fn publish_feedback(&self, channel: &str, feedback: &Feedback)
        -> Result<(), ChannelError>;
}

/// Re-publishes a feedback after a grace period
#[async_trait]
pub trait DelayedFeedbackManager: Send + Sync {
    async fn schedule(
        &self,
        channel: &str,
        feedback: Feedback,
        delay: Duration,
    ) -> Result<(), ChannelError>;
}
