// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minions are prepared and started right after the warm-up

use super::{failure, unexpected, Phase, Transition};
use crate::campaign::Campaign;
use crate::feedback::{Feedback, FeedbackKind, FeedbackStatus};

pub(super) fn process(campaign: &mut Campaign, feedback: &Feedback) -> Transition {
    match (&feedback.kind, feedback.status) {
        (
            FeedbackKind::MinionsDeclaration { .. }
            | FeedbackKind::MinionsRampUpPreparation { .. }
            | FeedbackKind::MinionsStart { .. },
            FeedbackStatus::Failed,
        ) => failure(campaign, feedback),
        // The first factory starting its minions means the campaign runs
        (FeedbackKind::MinionsStart { .. }, FeedbackStatus::Completed) => {
            Transition::To(Phase::Running {
                directives: Vec::new(),
                fresh: true,
            })
        }
        (
            FeedbackKind::MinionsDeclaration { .. }
            | FeedbackKind::MinionsRampUpPreparation { .. }
            | FeedbackKind::MinionsStart { .. },
            _,
        ) => Transition::Stay,
        _ => unexpected(campaign, feedback),
    }
}
