// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minions are declared and spread over the factories

use super::{
    decline_scenario, failure, unexpected, CampaignExecutionContext, Phase, StateError, Transition,
};
use crate::campaign::{Campaign, LaunchSequence};
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};

pub(super) fn init(campaign: &Campaign) -> Vec<Directive> {
    campaign
        .scenarios
        .iter()
        .map(|(scenario, configuration)| {
            Directive::broadcast(
                campaign,
                DirectiveKind::MinionsDeclaration {
                    scenario_name: scenario.clone(),
                    minions_count: configuration.minions_count,
                },
            )
        })
        .collect()
}

pub(super) async fn process(
    campaign: &mut Campaign,
    feedback: &Feedback,
    context: &CampaignExecutionContext,
) -> Result<Transition, StateError> {
    let scenario = match (&feedback.kind, feedback.status) {
        (
            FeedbackKind::MinionsDeclaration { .. } | FeedbackKind::MinionsAssignment { .. },
            FeedbackStatus::Failed,
        ) => return Ok(failure(campaign, feedback)),
        (FeedbackKind::MinionsAssignment { scenario_name }, FeedbackStatus::Ignored) => {
            decline_scenario(campaign, &feedback.node_id, scenario_name, context).await?;
            scenario_name
        }
        (FeedbackKind::MinionsAssignment { scenario_name }, FeedbackStatus::Completed) => {
            scenario_name
        }
        (FeedbackKind::MinionsDeclaration { .. } | FeedbackKind::MinionsAssignment { .. }, _) => {
            return Ok(Transition::Stay)
        }
        _ => return Ok(unexpected(campaign, feedback)),
    };

    let satisfied = context
        .store
        .mark_feedback_for_factory_scenario(
            &campaign.tenant,
            &campaign.key,
            &feedback.node_id,
            scenario,
        )
        .await?;
    if !satisfied {
        return Ok(Transition::Stay);
    }
    Ok(Transition::To(match campaign.launch_sequence {
        LaunchSequence::Prepared => Phase::Warmup,
        LaunchSequence::Scheduled => Phase::MinionsScheduleRampUp,
    }))
}

#[cfg(test)]
#[path = "minions_assignment_tests.rs"]
mod tests;
