// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolve the live state of a campaign from the store

use crate::ExecutorError;
use cm_core::{CampaignExecutionContext, CampaignExecutionState};
use std::sync::Arc;

/// Rebuild the state persisted for a campaign.
///
/// The rebuilt state is already initialized: the directives of its phase were
/// sent by the head that entered it. Campaigns absent from the store resolve
/// to the no-campaign state.
pub async fn resolve(
    context: &Arc<CampaignExecutionContext>,
    tenant: &str,
    campaign_key: &str,
) -> Result<CampaignExecutionState, ExecutorError> {
    let Some(stored) = context.store.get_state(tenant, campaign_key).await? else {
        tracing::debug!(tenant, campaign = campaign_key, "no campaign in the store");
        return Ok(CampaignExecutionState::no_campaign());
    };
    tracing::debug!(
        tenant,
        campaign = campaign_key,
        phase = %stored.phase,
        "campaign resolved from the store"
    );
    Ok(CampaignExecutionState::rebuild(
        stored.campaign,
        stored.phase,
        context.clone(),
    ))
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
