// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal phase: the campaign is closed, reported and forgotten

use super::{CampaignExecutionContext, StateError};
use crate::campaign::{Campaign, ExecutionStatus};
use crate::directive::{Directive, DirectiveKind};

pub(super) async fn init(
    campaign: &Campaign,
    successful: bool,
    context: &CampaignExecutionContext,
) -> Result<Vec<Directive>, StateError> {
    let status = match (successful, campaign.abort) {
        (true, _) => ExecutionStatus::Successful,
        (false, Some(_)) => ExecutionStatus::Aborted,
        (false, None) => ExecutionStatus::Failed,
    };
    tracing::info!(campaign = %campaign.key, %status, "campaign finished");

    context
        .campaign_service
        .close(&campaign.tenant, &campaign.key, status, campaign.message.as_deref())
        .await?;

    if let Some(report) = context.report_state_keeper.generate_report(&campaign.key).await? {
        for publisher in &context.report_publishers {
            if let Err(e) = publisher.publish(campaign, &report).await {
                tracing::warn!(campaign = %campaign.key, error = %e, "report publication failed");
            }
        }
    }

    let remaining = campaign.node_ids();
    if !remaining.is_empty() {
        context
            .factory_service
            .release_factories(campaign, &remaining)
            .await?;
    }
    context.store.clean(campaign).await?;

    Ok(vec![Directive::broadcast(
        campaign,
        DirectiveKind::CompleteCampaign {
            successful,
            message: campaign.message.clone(),
        },
    )])
}
