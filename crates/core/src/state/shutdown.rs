// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion and failure: factories shut the campaign down before it is disabled

use super::{acknowledges, unexpected, CampaignExecutionContext, Phase, StateError, Transition};
use crate::campaign::Campaign;
use crate::directive::{Directive, DirectiveKind};
use crate::feedback::{Feedback, FeedbackKind};

pub(super) async fn init_completion(
    campaign: &Campaign,
    context: &CampaignExecutionContext,
) -> Result<Vec<Directive>, StateError> {
    context.report_state_keeper.complete(&campaign.key).await?;
    Ok(init_failure(campaign))
}

pub(super) fn init_failure(campaign: &Campaign) -> Vec<Directive> {
    vec![Directive::broadcast(campaign, DirectiveKind::CampaignShutdown)]
}

pub(super) async fn process(
    campaign: &mut Campaign,
    feedback: &Feedback,
    successful: bool,
    context: &CampaignExecutionContext,
) -> Result<Transition, StateError> {
    if !acknowledges(campaign, feedback, &FeedbackKind::CampaignShutdown, context).await? {
        return Ok(unexpected(campaign, feedback));
    }
    let satisfied = context
        .store
        .mark_feedback_for_factory(&campaign.tenant, &campaign.key, &feedback.node_id)
        .await?;
    Ok(if satisfied {
        Transition::To(Phase::Disabled { successful })
    } else {
        Transition::Stay
    })
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
