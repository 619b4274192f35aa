// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minions execute; finished minions and scenarios are shut down as they end

use super::{failure, unexpected, CampaignExecutionContext, Phase, StateError, Transition};
use crate::campaign::Campaign;
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};

pub(super) async fn process(
    campaign: &mut Campaign,
    feedback: &Feedback,
    context: &CampaignExecutionContext,
) -> Result<Transition, StateError> {
    match (&feedback.kind, feedback.status) {
        (
            FeedbackKind::MinionsRampUpPreparation { .. } | FeedbackKind::MinionsStart { .. },
            FeedbackStatus::Failed,
        )
        | (FeedbackKind::FailedCampaign, _) => Ok(failure(campaign, feedback)),

        (
            FeedbackKind::CompleteMinion {
                scenario_name,
                minion_id,
            },
            _,
        ) => Ok(rerun(Directive::broadcast(
            campaign,
            DirectiveKind::MinionsShutdown {
                scenario_name: scenario_name.clone(),
                minion_ids: vec![minion_id.clone()],
            },
        ))),

        (FeedbackKind::EndOfCampaignScenario { scenario_name }, _) => {
            tracing::info!(campaign = %campaign.key, scenario = %scenario_name, "scenario ended");
            context
                .report_state_keeper
                .complete_scenario(&campaign.key, scenario_name)
                .await?;
            context
                .campaign_service
                .close_scenario(&campaign.tenant, &campaign.key, scenario_name)
                .await?;
            Ok(rerun(Directive::broadcast(
                campaign,
                DirectiveKind::CampaignScenarioShutdown {
                    scenario_name: scenario_name.clone(),
                },
            )))
        }

        (FeedbackKind::CampaignScenarioShutdown { scenario_name }, status)
            if status != FeedbackStatus::InProgress =>
        {
            let satisfied = context
                .store
                .mark_feedback_for_scenario(&campaign.tenant, &campaign.key, scenario_name)
                .await?;
            Ok(if satisfied {
                Transition::To(Phase::Completion)
            } else {
                Transition::Stay
            })
        }

        _ => Ok(unexpected(campaign, feedback)),
    }
}

/// Running again, only to publish one more directive
fn rerun(directive: Directive) -> Transition {
    Transition::To(Phase::Running {
        directives: vec![directive],
        fresh: false,
    })
}

#[cfg(test)]
#[path = "running_tests.rs"]
mod tests;
