// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feedbacks: acknowledgements sent from the factories to the head

use crate::campaign::ScenarioName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    InProgress,
    Completed,
    Failed,
    /// The factory declined the work
    Ignored,
}

impl FeedbackStatus {
    /// Completed or failed
    pub fn is_done(self) -> bool {
        matches!(self, FeedbackStatus::Completed | FeedbackStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub tenant: String,
    pub campaign_key: String,
    #[serde(default)]
    pub node_id: String,
    pub status: FeedbackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub kind: FeedbackKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackKind {
    FactoryAssignment,
    MinionsDeclaration { scenario_name: ScenarioName },
    MinionsAssignment { scenario_name: ScenarioName },
    ScenarioWarmUp { scenario_name: ScenarioName },
    MinionsRampUpPreparation { scenario_name: ScenarioName },
    MinionsStart { scenario_name: ScenarioName },
    CompleteMinion {
        scenario_name: ScenarioName,
        minion_id: String,
    },
    EndOfCampaignScenario { scenario_name: ScenarioName },
    CampaignScenarioShutdown { scenario_name: ScenarioName },
    FailedCampaign,
    CampaignShutdown,
    CampaignAbort,
    /// The factory cannot execute the campaign at all
    NodeExecution,
    /// Emitted by the head itself when the campaign exceeds its timeout
    CampaignTimeout { hard: bool },
}

impl FeedbackKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeedbackKind::FactoryAssignment => "factory_assignment",
            FeedbackKind::MinionsDeclaration { .. } => "minions_declaration",
            FeedbackKind::MinionsAssignment { .. } => "minions_assignment",
            FeedbackKind::ScenarioWarmUp { .. } => "scenario_warm_up",
            FeedbackKind::MinionsRampUpPreparation { .. } => "minions_ramp_up_preparation",
            FeedbackKind::MinionsStart { .. } => "minions_start",
            FeedbackKind::CompleteMinion { .. } => "complete_minion",
            FeedbackKind::EndOfCampaignScenario { .. } => "end_of_campaign_scenario",
            FeedbackKind::CampaignScenarioShutdown { .. } => "campaign_scenario_shutdown",
            FeedbackKind::FailedCampaign => "failed_campaign",
            FeedbackKind::CampaignShutdown => "campaign_shutdown",
            FeedbackKind::CampaignAbort => "campaign_abort",
            FeedbackKind::NodeExecution => "node_execution",
            FeedbackKind::CampaignTimeout { .. } => "campaign_timeout",
        }
    }

    pub fn scenario_name(&self) -> Option<&str> {
        match self {
            FeedbackKind::MinionsDeclaration { scenario_name }
            | FeedbackKind::MinionsAssignment { scenario_name }
            | FeedbackKind::ScenarioWarmUp { scenario_name }
            | FeedbackKind::MinionsRampUpPreparation { scenario_name }
            | FeedbackKind::MinionsStart { scenario_name }
            | FeedbackKind::CompleteMinion { scenario_name, .. }
            | FeedbackKind::EndOfCampaignScenario { scenario_name }
            | FeedbackKind::CampaignScenarioShutdown { scenario_name } => Some(scenario_name),
            _ => None,
        }
    }
}

impl Feedback {
    pub fn new(
        tenant: impl Into<String>,
        campaign_key: impl Into<String>,
        node_id: impl Into<String>,
        status: FeedbackStatus,
        kind: FeedbackKind,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            campaign_key: campaign_key.into(),
            node_id: node_id.into(),
            status,
            error: None,
            kind,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The reported error, or an empty message when the factory gave none
    pub fn error_message(&self) -> String {
        self.error.clone().unwrap_or_default()
    }
}
