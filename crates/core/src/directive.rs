// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directives: commands sent from the head to the factories

use crate::campaign::{Campaign, FactoryScenarioAssignment, ScenarioName};
use crate::profile::ExecutionProfileConfiguration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A command published on a broadcast or unicast channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub tenant: String,
    pub campaign_key: String,
    pub channel: String,
    #[serde(flatten)]
    pub kind: DirectiveKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectiveKind {
    FactoryAssignment {
        assignments: Vec<FactoryScenarioAssignment>,
        broadcast_channel: String,
        feedback_channel: String,
    },
    MinionsDeclaration {
        scenario_name: ScenarioName,
        minions_count: u32,
    },
    MinionsRampUpPreparation {
        scenario_name: ScenarioName,
        execution_profile: ExecutionProfileConfiguration,
        speed_factor: f64,
    },
    MinionsStart {
        scenario_name: ScenarioName,
        start_at: DateTime<Utc>,
    },
    ScenarioWarmUp {
        scenario_name: ScenarioName,
    },
    MinionsShutdown {
        scenario_name: ScenarioName,
        minion_ids: Vec<String>,
    },
    CampaignScenarioShutdown {
        scenario_name: ScenarioName,
    },
    CampaignShutdown,
    CampaignAbort {
        scenario_names: Vec<ScenarioName>,
        hard: bool,
    },
    CompleteCampaign {
        successful: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Directive {
    /// Directive for every factory of the campaign
    pub fn broadcast(campaign: &Campaign, kind: DirectiveKind) -> Self {
        Self::unicast(campaign, &campaign.broadcast_channel, kind)
    }

    /// Directive for the single factory listening on `channel`
    pub fn unicast(campaign: &Campaign, channel: &str, kind: DirectiveKind) -> Self {
        Self {
            tenant: campaign.tenant.clone(),
            campaign_key: campaign.key.clone(),
            channel: channel.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            DirectiveKind::FactoryAssignment { .. } => "factory_assignment",
            DirectiveKind::MinionsDeclaration { .. } => "minions_declaration",
            DirectiveKind::MinionsRampUpPreparation { .. } => "minions_ramp_up_preparation",
            DirectiveKind::MinionsStart { .. } => "minions_start",
            DirectiveKind::ScenarioWarmUp { .. } => "scenario_warm_up",
            DirectiveKind::MinionsShutdown { .. } => "minions_shutdown",
            DirectiveKind::CampaignScenarioShutdown { .. } => "campaign_scenario_shutdown",
            DirectiveKind::CampaignShutdown => "campaign_shutdown",
            DirectiveKind::CampaignAbort { .. } => "campaign_abort",
            DirectiveKind::CompleteCampaign { .. } => "complete_campaign",
        }
    }

    pub fn scenario_name(&self) -> Option<&str> {
        match &self.kind {
            DirectiveKind::MinionsDeclaration { scenario_name, .. }
            | DirectiveKind::MinionsRampUpPreparation { scenario_name, .. }
            | DirectiveKind::MinionsStart { scenario_name, .. }
            | DirectiveKind::ScenarioWarmUp { scenario_name }
            | DirectiveKind::MinionsShutdown { scenario_name, .. }
            | DirectiveKind::CampaignScenarioShutdown { scenario_name } => Some(scenario_name),
            _ => None,
        }
    }
}
