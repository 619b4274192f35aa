// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aborting: factories stop their minions, silent ones are forced through
//! after a grace period

use super::{
    acknowledges, unexpected, CampaignExecutionContext, Phase, StateError, Transition,
    ABORT_MESSAGE,
};
use crate::adapters::FactoryState;
use crate::campaign::{AbortConfiguration, Campaign, ExecutionStatus};
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};
use std::collections::BTreeSet;

pub(super) async fn init(
    campaign: &Campaign,
    configuration: AbortConfiguration,
    context: &CampaignExecutionContext,
) -> Result<Vec<Directive>, StateError> {
    for node_id in campaign.factories.keys() {
        let forced = Feedback::new(
            &campaign.tenant,
            &campaign.key,
            node_id,
            FeedbackStatus::Completed,
            FeedbackKind::CampaignAbort,
        );
        context
            .delayed_feedback_manager
            .schedule(&campaign.feedback_channel, forced, context.abort_grace_period)
            .await?;
    }

    Ok(vec![Directive::broadcast(
        campaign,
        DirectiveKind::CampaignAbort {
            scenario_names: campaign.scenario_names(),
            hard: configuration.hard,
        },
    )])
}

pub(super) async fn process(
    campaign: &mut Campaign,
    feedback: &Feedback,
    configuration: AbortConfiguration,
    error: &str,
    context: &CampaignExecutionContext,
) -> Result<Transition, StateError> {
    if !acknowledges(campaign, feedback, &FeedbackKind::CampaignAbort, context).await? {
        return Ok(unexpected(campaign, feedback));
    }
    let satisfied = context
        .store
        .mark_feedback_for_factory(&campaign.tenant, &campaign.key, &feedback.node_id)
        .await?;
    if !satisfied {
        return Ok(Transition::Stay);
    }

    if !configuration.hard {
        return Ok(Transition::To(Phase::Completion));
    }
    context
        .campaign_service
        .close(
            &campaign.tenant,
            &campaign.key,
            ExecutionStatus::Aborted,
            Some(error),
        )
        .await?;
    context.report_state_keeper.abort(&campaign.key).await?;
    Ok(Transition::To(Phase::Failure {
        error: error.to_string(),
    }))
}

/// Abort only with the factories still able to answer; without any, the
/// campaign is disabled straight away
pub(super) async fn abort_healthy_factories(
    campaign: &mut Campaign,
    configuration: AbortConfiguration,
    context: &CampaignExecutionContext,
) -> Result<Phase, StateError> {
    let node_ids = campaign.node_ids();
    let healthy: BTreeSet<String> = context
        .factory_service
        .get_factories_health(&campaign.tenant, &node_ids)
        .await?
        .into_iter()
        .filter(|health| health.state == FactoryState::Idle)
        .map(|health| health.node_id)
        .collect();

    for node_id in node_ids.iter().filter(|node_id| !healthy.contains(*node_id)) {
        tracing::warn!(campaign = %campaign.key, node = %node_id, "unhealthy factory left out of the abort");
        campaign.unassign_factory(node_id);
    }

    if healthy.is_empty() {
        campaign.message = Some(ABORT_MESSAGE.to_string());
        campaign.abort = Some(configuration);
        return Ok(Phase::Disabled { successful: false });
    }
    Ok(Phase::Aborting {
        configuration,
        error: ABORT_MESSAGE.to_string(),
    })
}

#[cfg(test)]
#[path = "aborting_tests.rs"]
mod tests;
