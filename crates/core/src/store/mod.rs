// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence port of the campaign state machine.
//!
//! A store keeps, per campaign, the serialized configuration, the label of the
//! current phase and the feedbacks the phase still waits for. Every phase
//! seeds its expectations when entered and marks them as feedbacks arrive;
//! the phase is satisfied once the marked set is empty.

mod memory;

pub use memory::InMemoryCampaignStore;

use crate::campaign::Campaign;
use async_trait::async_trait;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unresolvable phase '{label}' for campaign {tenant}:{campaign_key}")]
    UnresolvablePhase {
        tenant: String,
        campaign_key: String,
        label: String,
    },
}

/// Persisted label of a phase, stored next to the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseLabel {
    FactoryDagsAssignment,
    MinionsAssignment,
    Warmup,
    MinionsScheduleRampUp,
    MinionsStartup,
    Running,
    Completion,
    Failure,
    Aborting,
}

impl PhaseLabel {
    pub const ALL: [PhaseLabel; 9] = [
        PhaseLabel::FactoryDagsAssignment,
        PhaseLabel::MinionsAssignment,
        PhaseLabel::Warmup,
        PhaseLabel::MinionsScheduleRampUp,
        PhaseLabel::MinionsStartup,
        PhaseLabel::Running,
        PhaseLabel::Completion,
        PhaseLabel::Failure,
        PhaseLabel::Aborting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseLabel::FactoryDagsAssignment => "FACTORY_DAGS_ASSIGNMENT_STATE",
            PhaseLabel::MinionsAssignment => "MINIONS_ASSIGNMENT_STATE",
            PhaseLabel::Warmup => "WARMUP_STATE",
            PhaseLabel::MinionsScheduleRampUp => "MINIONS_SCHEDULE_RAMP_UP_STATE",
            PhaseLabel::MinionsStartup => "MINIONS_STARTUP_STATE",
            PhaseLabel::Running => "RUNNING_STATE",
            PhaseLabel::Completion => "COMPLETION_STATE",
            PhaseLabel::Failure => "FAILURE_STATE",
            PhaseLabel::Aborting => "ABORTING_STATE",
        }
    }
}

impl std::fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error of parsing an unknown phase label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase label: {0}")]
pub struct UnknownPhaseLabel(pub String);

impl FromStr for PhaseLabel {
    type Err = UnknownPhaseLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownPhaseLabel(s.to_string()))
    }
}

/// Persisted campaign with the phase it was in
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCampaign {
    pub campaign: Campaign,
    pub phase: PhaseLabel,
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Whether several heads share this store and may advance the same campaign
    fn is_distributed(&self) -> bool {
        false
    }

    async fn save_configuration(&self, campaign: &Campaign) -> Result<(), StoreError>;

    async fn set_phase(
        &self,
        tenant: &str,
        campaign_key: &str,
        phase: PhaseLabel,
    ) -> Result<(), StoreError>;

    /// `None` when no configuration is persisted for the campaign.
    ///
    /// A configuration without a known phase label is `UnresolvablePhase`.
    async fn get_state(
        &self,
        tenant: &str,
        campaign_key: &str,
    ) -> Result<Option<StoredCampaign>, StoreError>;

    /// Expect one feedback per factory of the campaign
    async fn prepare_factories_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError>;

    /// Expect one feedback per scenario of the campaign
    async fn prepare_scenarios_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError>;

    /// Expect one feedback per scenario assigned to each factory
    async fn prepare_assignments_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError>;

    /// Returns whether no factory is expected anymore
    async fn mark_feedback_for_factory(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
    ) -> Result<bool, StoreError>;

    /// Returns whether no scenario is expected anymore
    async fn mark_feedback_for_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<bool, StoreError>;

    /// Removes the scenario from the factory, then the factory once it has
    /// nothing left; returns whether no factory is expected anymore
    async fn mark_feedback_for_factory_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
        scenario: &str,
    ) -> Result<bool, StoreError>;

    /// Forget everything about a finished campaign
    async fn clean(&self, campaign: &Campaign) -> Result<(), StoreError>;
}
