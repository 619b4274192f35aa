// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campaign execution state machine.
//!
//! A [`CampaignExecutionState`] is the single live state of one campaign. It
//! emits directives once when entered ([`CampaignExecutionState::init`]) and
//! folds feedbacks into itself or into the next state
//! ([`CampaignExecutionState::process`]).
//!
//! Phase logic lives in one module per phase. Persistence goes through the
//! [`CampaignStore`](crate::store::CampaignStore) of the injected context: the
//! phase label, the configuration and the expected feedbacks are saved before
//! any directive is computed, so a state rebuilt from the store resumes where
//! the crashed head stopped.

mod aborting;
mod context;
mod disabled;
mod factory_assignment;
mod minions_assignment;
mod minions_startup;
mod running;
mod schedule_ramp_up;
mod shutdown;
mod warmup;

pub use context::{CampaignExecutionContext, DEFAULT_ABORT_GRACE_PERIOD};

use crate::adapters::{ChannelError, ServiceError};
use crate::campaign::{AbortConfiguration, Campaign, NodeId};
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};
use crate::profile::plan;
use crate::store::{PhaseLabel, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Error recorded on the campaign when it is aborted
pub const ABORT_MESSAGE: &str = "The campaign was aborted";

/// Error recorded on the campaign once no factory is left
pub const NO_FACTORY_MESSAGE: &str = "No factory is available to execute the campaign";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("no campaign is running, cannot process {feedback} for campaign '{campaign_key}'")]
    NoCampaign {
        feedback: String,
        campaign_key: String,
    },
    #[error("state of campaign '{0}' has no execution context")]
    NotInjected(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Phase of a campaign, with the data only this phase needs
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    FactoryAssignment,
    MinionsAssignment,
    Warmup,
    MinionsScheduleRampUp,
    MinionsStartup,
    Running {
        /// Directives to emit when entered
        directives: Vec<Directive>,
        /// First entry: the scenarios are not expected yet
        fresh: bool,
    },
    Completion,
    Failure {
        error: String,
    },
    Aborting {
        configuration: AbortConfiguration,
        error: String,
    },
    Disabled {
        successful: bool,
    },
    NoCampaign,
}

/// Feedbacks a phase waits for before moving on
enum Expectations {
    Nothing,
    Factories,
    Scenarios,
    Assignments,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::FactoryAssignment => "factory_assignment",
            Phase::MinionsAssignment => "minions_assignment",
            Phase::Warmup => "warmup",
            Phase::MinionsScheduleRampUp => "minions_schedule_ramp_up",
            Phase::MinionsStartup => "minions_startup",
            Phase::Running { .. } => "running",
            Phase::Completion => "completion",
            Phase::Failure { .. } => "failure",
            Phase::Aborting { .. } => "aborting",
            Phase::Disabled { .. } => "disabled",
            Phase::NoCampaign => "no_campaign",
        }
    }

    /// Label persisted for recovery; terminal phases have none
    pub fn label(&self) -> Option<PhaseLabel> {
        match self {
            Phase::FactoryAssignment => Some(PhaseLabel::FactoryDagsAssignment),
            Phase::MinionsAssignment => Some(PhaseLabel::MinionsAssignment),
            Phase::Warmup => Some(PhaseLabel::Warmup),
            Phase::MinionsScheduleRampUp => Some(PhaseLabel::MinionsScheduleRampUp),
            Phase::MinionsStartup => Some(PhaseLabel::MinionsStartup),
            Phase::Running { .. } => Some(PhaseLabel::Running),
            Phase::Completion => Some(PhaseLabel::Completion),
            Phase::Failure { .. } => Some(PhaseLabel::Failure),
            Phase::Aborting { .. } => Some(PhaseLabel::Aborting),
            Phase::Disabled { .. } | Phase::NoCampaign => None,
        }
    }

    /// Phases accepting an abort and failing on node execution errors
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Phase::FactoryAssignment
                | Phase::MinionsAssignment
                | Phase::Warmup
                | Phase::MinionsScheduleRampUp
                | Phase::MinionsStartup
                | Phase::Running { .. }
        )
    }

    fn expectations(&self) -> Expectations {
        match self {
            Phase::FactoryAssignment
            | Phase::Completion
            | Phase::Failure { .. }
            | Phase::Aborting { .. } => Expectations::Factories,
            Phase::MinionsAssignment | Phase::Warmup => Expectations::Assignments,
            Phase::MinionsScheduleRampUp => Expectations::Scenarios,
            Phase::Running { fresh: true, .. } => Expectations::Scenarios,
            Phase::Running { fresh: false, .. }
            | Phase::MinionsStartup
            | Phase::Disabled { .. }
            | Phase::NoCampaign => Expectations::Nothing,
        }
    }

    /// Phase matching a persisted label, restored from the campaign itself
    fn restore(label: PhaseLabel, campaign: &Campaign) -> Self {
        match label {
            PhaseLabel::FactoryDagsAssignment => Phase::FactoryAssignment,
            PhaseLabel::MinionsAssignment => Phase::MinionsAssignment,
            PhaseLabel::Warmup => Phase::Warmup,
            PhaseLabel::MinionsScheduleRampUp => Phase::MinionsScheduleRampUp,
            PhaseLabel::MinionsStartup => Phase::MinionsStartup,
            PhaseLabel::Running => Phase::Running {
                directives: Vec::new(),
                fresh: false,
            },
            PhaseLabel::Completion => Phase::Completion,
            PhaseLabel::Failure => Phase::Failure {
                error: campaign.message.clone().unwrap_or_default(),
            },
            PhaseLabel::Aborting => Phase::Aborting {
                configuration: campaign.abort.unwrap_or_default(),
                error: campaign
                    .message
                    .clone()
                    .unwrap_or_else(|| ABORT_MESSAGE.to_string()),
            },
        }
    }
}

/// Outcome of folding a feedback into a phase
pub(crate) enum Transition {
    Stay,
    To(Phase),
}

/// The live state of one campaign
pub struct CampaignExecutionState {
    campaign: Campaign,
    phase: Phase,
    initialized: bool,
    context: Option<Arc<CampaignExecutionContext>>,
}

impl std::fmt::Debug for CampaignExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignExecutionState")
            .field("tenant", &self.campaign.tenant)
            .field("campaign", &self.campaign.key)
            .field("phase", &self.phase)
            .field("initialized", &self.initialized)
            .field("injected", &self.context.is_some())
            .finish()
    }
}

impl CampaignExecutionState {
    /// State of a campaign about to start: factories get their assignments first
    pub fn new(campaign: Campaign) -> Self {
        Self::in_phase(campaign, Phase::FactoryAssignment)
    }

    /// Uninitialized state entering the given phase
    pub fn in_phase(campaign: Campaign, phase: Phase) -> Self {
        Self {
            campaign,
            phase,
            initialized: false,
            context: None,
        }
    }

    /// No campaign exists; any feedback is an invariant violation
    pub fn no_campaign() -> Self {
        Self::in_phase(Campaign::default(), Phase::NoCampaign)
    }

    /// State restored from the store; already initialized, so its directives
    /// are not sent twice
    pub fn rebuild(
        campaign: Campaign,
        label: PhaseLabel,
        context: Arc<CampaignExecutionContext>,
    ) -> Self {
        let phase = Phase::restore(label, &campaign);
        Self {
            campaign,
            phase,
            initialized: true,
            context: Some(context),
        }
    }

    pub fn inject(&mut self, context: Arc<CampaignExecutionContext>) {
        self.context = Some(context);
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    pub fn campaign_mut(&mut self) -> &mut Campaign {
        &mut self.campaign
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_label(&self) -> Option<PhaseLabel> {
        self.phase.label()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Nothing will ever happen to this campaign anymore
    pub fn is_completed(&self) -> bool {
        matches!(self.phase, Phase::Disabled { .. } | Phase::NoCampaign)
    }

    fn context(&self) -> Result<Arc<CampaignExecutionContext>, StateError> {
        self.context
            .clone()
            .ok_or_else(|| StateError::NotInjected(self.campaign.key.clone()))
    }

    /// Directives to publish when entering the phase; empty on every later call
    pub async fn init(&mut self) -> Result<Vec<Directive>, StateError> {
        if self.initialized {
            return Ok(Vec::new());
        }
        if matches!(self.phase, Phase::NoCampaign) {
            self.initialized = true;
            return Ok(Vec::new());
        }
        let context = self.context()?;

        self.record_entry();
        self.persist(&context).await?;

        let campaign = &self.campaign;
        let directives = match &mut self.phase {
            Phase::FactoryAssignment => factory_assignment::init(campaign),
            Phase::MinionsAssignment => minions_assignment::init(campaign),
            Phase::Warmup => warmup::init(campaign),
            Phase::MinionsScheduleRampUp | Phase::MinionsStartup => ramp_up_directives(campaign),
            Phase::Running { directives, .. } => std::mem::take(directives),
            Phase::Completion => shutdown::init_completion(campaign, &context).await?,
            Phase::Failure { .. } => shutdown::init_failure(campaign),
            Phase::Aborting { configuration, .. } => {
                aborting::init(campaign, *configuration, &context).await?
            }
            Phase::Disabled { successful } => disabled::init(campaign, *successful, &context).await?,
            Phase::NoCampaign => Vec::new(),
        };
        self.initialized = true;

        tracing::debug!(
            campaign = %self.campaign.key,
            phase = self.phase.name(),
            directives = directives.len(),
            "phase entered"
        );
        Ok(directives)
    }

    /// Fold a feedback into this state or the next one.
    ///
    /// Unrelated feedbacks leave the state unchanged.
    pub async fn process(mut self, feedback: &Feedback) -> Result<Self, StateError> {
        if matches!(self.phase, Phase::NoCampaign) {
            return Err(StateError::NoCampaign {
                feedback: feedback.name().to_string(),
                campaign_key: feedback.campaign_key.clone(),
            });
        }
        let context = self.context()?;

        if self.phase.is_active()
            && feedback.kind == FeedbackKind::NodeExecution
            && feedback.status == FeedbackStatus::Failed
        {
            let transition = failure(&self.campaign, feedback);
            return Ok(self.apply(transition));
        }

        let campaign = &mut self.campaign;
        let transition = match &self.phase {
            Phase::FactoryAssignment => factory_assignment::process(campaign, feedback, &context).await?,
            Phase::MinionsAssignment => minions_assignment::process(campaign, feedback, &context).await?,
            Phase::Warmup => warmup::process(campaign, feedback, &context).await?,
            Phase::MinionsScheduleRampUp => schedule_ramp_up::process(campaign, feedback, &context).await?,
            Phase::MinionsStartup => minions_startup::process(campaign, feedback),
            Phase::Running { .. } => running::process(campaign, feedback, &context).await?,
            Phase::Completion => shutdown::process(campaign, feedback, true, &context).await?,
            Phase::Failure { .. } => shutdown::process(campaign, feedback, false, &context).await?,
            Phase::Aborting {
                configuration,
                error,
            } => aborting::process(campaign, feedback, *configuration, error, &context).await?,
            Phase::Disabled { .. } | Phase::NoCampaign => Transition::Stay,
        };
        Ok(self.apply(transition))
    }

    /// Abort the campaign; finishing campaigns are left unchanged
    pub async fn abort(mut self, configuration: AbortConfiguration) -> Result<Self, StateError> {
        match &self.phase {
            Phase::FactoryAssignment | Phase::MinionsScheduleRampUp => {
                let context = self.context()?;
                let phase =
                    aborting::abort_healthy_factories(&mut self.campaign, configuration, &context)
                        .await?;
                Ok(self.transition_to(phase))
            }
            Phase::MinionsAssignment
            | Phase::Warmup
            | Phase::MinionsStartup
            | Phase::Running { .. } => Ok(self.transition_to(Phase::Aborting {
                configuration,
                error: ABORT_MESSAGE.to_string(),
            })),
            Phase::Completion
            | Phase::Failure { .. }
            | Phase::Aborting { .. }
            | Phase::Disabled { .. }
            | Phase::NoCampaign => {
                tracing::debug!(
                    campaign = %self.campaign.key,
                    phase = self.phase.name(),
                    "abort ignored, the campaign is already finishing"
                );
                Ok(self)
            }
        }
    }

    /// Give up a campaign left without any factory to talk to
    pub fn disable_without_factories(mut self) -> Self {
        tracing::warn!(
            campaign = %self.campaign.key,
            phase = self.phase.name(),
            "no factory left"
        );
        self.campaign.message = Some(NO_FACTORY_MESSAGE.to_string());
        self.transition_to(Phase::Disabled { successful: false })
    }

    fn apply(self, transition: Transition) -> Self {
        match transition {
            Transition::Stay => self,
            Transition::To(phase) => self.transition_to(phase),
        }
    }

    fn transition_to(self, phase: Phase) -> Self {
        tracing::info!(
            campaign = %self.campaign.key,
            from = self.phase.name(),
            to = phase.name(),
            "transition"
        );
        Self {
            campaign: self.campaign,
            phase,
            initialized: false,
            context: self.context,
        }
    }

    /// Changes to the campaign a phase makes as soon as it is entered
    fn record_entry(&mut self) {
        match &self.phase {
            Phase::Failure { error } => self.campaign.message = Some(error.clone()),
            Phase::Aborting {
                configuration,
                error,
            } => {
                self.campaign.message = Some(error.clone());
                self.campaign.abort = Some(*configuration);
            }
            _ => {}
        }
    }

    async fn persist(&self, context: &CampaignExecutionContext) -> Result<(), StateError> {
        let Some(label) = self.phase.label() else {
            return Ok(());
        };
        let store = &context.store;
        let campaign = &self.campaign;

        store.save_configuration(campaign).await?;
        match self.phase.expectations() {
            Expectations::Nothing => {}
            Expectations::Factories => {
                store.prepare_factories_for_feedback_expectations(campaign).await?
            }
            Expectations::Scenarios => {
                store.prepare_scenarios_for_feedback_expectations(campaign).await?
            }
            Expectations::Assignments => {
                store.prepare_assignments_for_feedback_expectations(campaign).await?
            }
        }
        store.set_phase(&campaign.tenant, &campaign.key, label).await?;
        Ok(())
    }
}

/// First failure wins: the campaign fails whatever else is pending
fn failure(campaign: &Campaign, feedback: &Feedback) -> Transition {
    let error = feedback.error_message();
    tracing::error!(
        campaign = %campaign.key,
        node = %feedback.node_id,
        feedback = feedback.name(),
        error = %error,
        "feedback failed"
    );
    Transition::To(Phase::Failure { error })
}

fn unexpected(campaign: &Campaign, feedback: &Feedback) -> Transition {
    tracing::debug!(
        campaign = %campaign.key,
        node = %feedback.node_id,
        feedback = feedback.name(),
        status = ?feedback.status,
        "feedback ignored"
    );
    Transition::Stay
}

/// A factory declined a scenario: shrink its assignment and release it once
/// it owns nothing
async fn decline_scenario(
    campaign: &mut Campaign,
    node_id: &NodeId,
    scenario: &str,
    context: &CampaignExecutionContext,
) -> Result<(), StateError> {
    if !campaign.is_assigned(node_id, scenario) {
        tracing::debug!(
            campaign = %campaign.key,
            node = %node_id,
            scenario,
            "decline of a scenario the factory does not own"
        );
        return Ok(());
    }
    tracing::info!(
        campaign = %campaign.key,
        node = %node_id,
        scenario,
        "factory declined a scenario"
    );
    if campaign.unassign_scenario_of_factory(scenario, node_id) {
        context
            .factory_service
            .release_factories(campaign, std::slice::from_ref(node_id))
            .await?;
    }
    context.store.save_configuration(campaign).await?;
    Ok(())
}

/// Whether the feedback closes the part of `node_id` in a factory-wide
/// handshake (shutdown, abort); a failing node counts as done
async fn acknowledges(
    campaign: &mut Campaign,
    feedback: &Feedback,
    expected: &FeedbackKind,
    context: &CampaignExecutionContext,
) -> Result<bool, StateError> {
    if &feedback.kind == expected {
        return Ok(feedback.status.is_done() || feedback.status == FeedbackStatus::Ignored);
    }
    if feedback.kind == FeedbackKind::NodeExecution && feedback.status.is_done() {
        if campaign.unassign_factory(&feedback.node_id) {
            context.store.save_configuration(campaign).await?;
        }
        return Ok(true);
    }
    Ok(false)
}

/// One ramp-up preparation per scenario, carrying its execution profile
fn ramp_up_directives(campaign: &Campaign) -> Vec<Directive> {
    campaign
        .scenarios
        .iter()
        .map(|(scenario, configuration)| {
            match configuration.execution_profile.local_profile() {
                Some(profile) => {
                    let (lines, minions) =
                        plan(profile.as_ref(), configuration.minions_count, campaign.speed_factor);
                    if minions != configuration.minions_count {
                        tracing::warn!(
                            campaign = %campaign.key,
                            scenario = %scenario,
                            planned = minions,
                            declared = configuration.minions_count,
                            "ramp-up does not start every declared minion"
                        );
                    }
                    tracing::debug!(campaign = %campaign.key, scenario = %scenario, lines, minions, "ramp-up planned");
                }
                None => {
                    tracing::debug!(campaign = %campaign.key, scenario = %scenario, "ramp-up paced by the factories")
                }
            }
            Directive::broadcast(
                campaign,
                DirectiveKind::MinionsRampUpPreparation {
                    scenario_name: scenario.clone(),
                    execution_profile: configuration.execution_profile.clone(),
                    speed_factor: campaign.speed_factor,
                },
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "test_helpers.rs"]
pub(crate) mod test_helpers;

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
