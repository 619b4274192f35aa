// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factories compute the starting lines of their minions ahead of the warm-up

use super::{failure, unexpected, CampaignExecutionContext, Phase, StateError, Transition};
use crate::campaign::Campaign;
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};

pub(super) async fn process(
    campaign: &mut Campaign,
    feedback: &Feedback,
    context: &CampaignExecutionContext,
) -> Result<Transition, StateError> {
    let FeedbackKind::MinionsRampUpPreparation { scenario_name } = &feedback.kind else {
        return Ok(unexpected(campaign, feedback));
    };
    match feedback.status {
        FeedbackStatus::Failed => return Ok(failure(campaign, feedback)),
        FeedbackStatus::Completed => {}
        FeedbackStatus::InProgress | FeedbackStatus::Ignored => return Ok(Transition::Stay),
    }

    let satisfied = context
        .store
        .mark_feedback_for_scenario(&campaign.tenant, &campaign.key, scenario_name)
        .await?;
    Ok(if satisfied {
        Transition::To(Phase::Warmup)
    } else {
        Transition::Stay
    })
}

#[cfg(test)]
#[path = "ramp_up_tests.rs"]
mod tests;
