// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Services for a head deployed without campaign bookkeeping or a factory registry.

use async_trait::async_trait;
use cm_core::{
    Campaign, CampaignService, ExecutionStatus, FactoryHealth, FactoryService, FactoryState,
    NodeId, ServiceError,
};

/// Campaign service that only logs what it is told.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpCampaignService;

impl NoOpCampaignService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CampaignService for NoOpCampaignService {
    async fn close(
        &self,
        tenant: &str,
        campaign_key: &str,
        status: ExecutionStatus,
        message: Option<&str>,
    ) -> Result<(), ServiceError> {
        tracing::info!(tenant, campaign = campaign_key, %status, message, "campaign closed");
        Ok(())
    }

    async fn close_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(tenant, campaign = campaign_key, scenario, "scenario closed");
        Ok(())
    }

    async fn abort(
        &self,
        tenant: &str,
        aborter: &str,
        campaign_key: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(tenant, campaign = campaign_key, aborter, "abort recorded");
        Ok(())
    }
}

/// Factory registry that trusts every factory to be idle.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpFactoryService;

impl NoOpFactoryService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FactoryService for NoOpFactoryService {
    async fn release_factories(
        &self,
        _campaign: &Campaign,
        _node_ids: &[NodeId],
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn get_factories_health(
        &self,
        _tenant: &str,
        node_ids: &[NodeId],
    ) -> Result<Vec<FactoryHealth>, ServiceError> {
        Ok(node_ids
            .iter()
            .map(|node_id| FactoryHealth {
                node_id: node_id.clone(),
                state: FactoryState::Idle,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
