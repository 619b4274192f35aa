// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factories receive the DAGs they execute for each scenario

use super::{failure, unexpected, CampaignExecutionContext, Phase, StateError, Transition};
use crate::campaign::Campaign;
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};

pub(super) fn init(campaign: &Campaign) -> Vec<Directive> {
    campaign
        .factories
        .values()
        .map(|factory| {
            Directive::unicast(
                campaign,
                &factory.unicast_channel,
                DirectiveKind::FactoryAssignment {
                    assignments: factory.assignment.values().cloned().collect(),
                    broadcast_channel: campaign.broadcast_channel.clone(),
                    feedback_channel: campaign.feedback_channel.clone(),
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
    if feedback.kind != FeedbackKind::FactoryAssignment {
        return Ok(unexpected(campaign, feedback));
    }
    match feedback.status {
        FeedbackStatus::InProgress => return Ok(Transition::Stay),
        FeedbackStatus::Failed => return Ok(failure(campaign, feedback)),
        FeedbackStatus::Completed => {}
        FeedbackStatus::Ignored => {
            if campaign.unassign_factory(&feedback.node_id) {
                tracing::info!(
                    campaign = %campaign.key,
                    node = %feedback.node_id,
                    "factory declined its assignment"
                );
                context
                    .factory_service
                    .release_factories(campaign, std::slice::from_ref(&feedback.node_id))
                    .await?;
                context.store.save_configuration(campaign).await?;
            }
        }
    }

    let satisfied = context
        .store
        .mark_feedback_for_factory(&campaign.tenant, &campaign.key, &feedback.node_id)
        .await?;
    Ok(if satisfied {
        Transition::To(Phase::MinionsAssignment)
    } else {
        Transition::Stay
    })
}

#[cfg(test)]
#[path = "factory_assignment_tests.rs"]
mod tests;
