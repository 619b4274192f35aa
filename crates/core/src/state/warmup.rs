// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Every factory warms up the scenarios it was assigned

use super::{
    decline_scenario, failure, unexpected, CampaignExecutionContext, Phase, StateError, Transition,
};
use crate::campaign::{Campaign, LaunchSequence};
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};

pub(super) fn init(campaign: &Campaign) -> Vec<Directive> {
    campaign
        .factories
        .values()
        .flat_map(|factory| {
            factory.assignment.keys().map(move |scenario| {
                Directive::unicast(
                    campaign,
                    &factory.unicast_channel,
                    DirectiveKind::ScenarioWarmUp {
                        scenario_name: scenario.clone(),
                    },
                )
            })
        })
        .collect()
}

pub(super) async fn process(
    campaign: &mut Campaign,
    feedback: &Feedback,
    context: &CampaignExecutionContext,
) -> Result<Transition, StateError> {
    let FeedbackKind::ScenarioWarmUp { scenario_name } = &feedback.kind else {
        return Ok(unexpected(campaign, feedback));
    };
    match feedback.status {
        FeedbackStatus::InProgress => return Ok(Transition::Stay),
        FeedbackStatus::Failed => return Ok(failure(campaign, feedback)),
        FeedbackStatus::Ignored => {
            decline_scenario(campaign, &feedback.node_id, scenario_name, context).await?
        }
        FeedbackStatus::Completed => {}
    }

    let satisfied = context
        .store
        .mark_feedback_for_factory_scenario(
            &campaign.tenant,
            &campaign.key,
            &feedback.node_id,
            scenario_name,
        )
        .await?;
    if !satisfied {
        return Ok(Transition::Stay);
    }
    Ok(Transition::To(match campaign.launch_sequence {
        LaunchSequence::Prepared => Phase::MinionsStartup,
        LaunchSequence::Scheduled => Phase::Running {
            directives: start_directives(campaign, context),
            fresh: true,
        },
    }))
}

/// All the scenarios start together, once the start offset elapsed
fn start_directives(campaign: &Campaign, context: &CampaignExecutionContext) -> Vec<Directive> {
    let start_at = context.clock.now_plus(campaign.start_offset);
    campaign
        .scenarios
        .keys()
        .map(|scenario| {
            Directive::broadcast(
                campaign,
                DirectiveKind::MinionsStart {
                    scenario_name: scenario.clone(),
                    start_at,
                },
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "warmup_tests.rs"]
mod tests;
