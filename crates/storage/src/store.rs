// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campaign store shared by all the heads through Redis

use crate::error::{backend, RedisStoreError};
use crate::keys;
use async_trait::async_trait;
use cm_core::{Campaign, CampaignStore, PhaseLabel, StoreError, StoredCampaign};
use redis::aio::ConnectionManager;

/// Persists campaigns in Redis so that any head can resume them.
///
/// Expectation sets are replaced and reduced inside `MULTI` blocks: several
/// heads may fold feedbacks of the same campaign concurrently.
#[derive(Clone)]
pub struct RedisCampaignStore {
    connection: ConnectionManager,
}

impl RedisCampaignStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Connect to the Redis server at `url`
    pub async fn connect(url: &str) -> Result<Self, RedisStoreError> {
        Ok(Self::new(crate::connect(url).await?))
    }

    /// Atomically replace a set with new members
    async fn replace_set(&self, key: &str, members: &[&String]) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("UNLINK").arg(key).ignore();
        if !members.is_empty() {
            pipe.cmd("SADD").arg(key).arg(members).ignore();
        }
        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await.map_err(backend)?;
        Ok(())
    }

    /// Remove a member and report whether the set is gone
    async fn remove_member(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let (exists,): (bool,) = redis::pipe()
            .atomic()
            .cmd("SREM")
            .arg(key)
            .arg(member)
            .ignore()
            .cmd("EXISTS")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        Ok(!exists)
    }
}

#[async_trait]
impl CampaignStore for RedisCampaignStore {
    async fn save_configuration(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let configuration = serde_json::to_string(campaign)?;
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("HSET")
            .arg(keys::campaign(&campaign.tenant, &campaign.key))
            .arg(keys::CONFIGURATION_FIELD)
            .arg(configuration)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn set_phase(
        &self,
        tenant: &str,
        campaign_key: &str,
        phase: PhaseLabel,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("HSET")
            .arg(keys::campaign(tenant, campaign_key))
            .arg(keys::STATE_FIELD)
            .arg(phase.as_str())
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_state(
        &self,
        tenant: &str,
        campaign_key: &str,
    ) -> Result<Option<StoredCampaign>, StoreError> {
        let mut connection = self.connection.clone();
        let (configuration, label): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(keys::campaign(tenant, campaign_key))
            .arg(keys::CONFIGURATION_FIELD)
            .arg(keys::STATE_FIELD)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;

        let Some(configuration) = configuration else {
            return Ok(None);
        };
        let unresolvable = |label: String| StoreError::UnresolvablePhase {
            tenant: tenant.to_string(),
            campaign_key: campaign_key.to_string(),
            label,
        };
        let label = label.ok_or_else(|| unresolvable(String::new()))?;
        let phase = label
            .parse::<PhaseLabel>()
            .map_err(|_| unresolvable(label.clone()))?;
        let campaign: Campaign = serde_json::from_str(&configuration)?;
        Ok(Some(StoredCampaign { campaign, phase }))
    }

    async fn prepare_factories_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        let nodes: Vec<&String> = campaign.factories.keys().collect();
        self.replace_set(&keys::feedback(&campaign.tenant, &campaign.key), &nodes)
            .await
    }

    async fn prepare_scenarios_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        let scenarios: Vec<&String> = campaign.scenarios.keys().collect();
        self.replace_set(&keys::feedback(&campaign.tenant, &campaign.key), &scenarios)
            .await
    }

    async fn prepare_assignments_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        let feedback_key = keys::feedback(&campaign.tenant, &campaign.key);
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("UNLINK").arg(&feedback_key).ignore();

        let mut nodes = Vec::new();
        for (node_id, factory) in &campaign.factories {
            let factory_key = keys::factory_feedback(&campaign.tenant, &campaign.key, node_id);
            pipe.cmd("UNLINK").arg(&factory_key).ignore();
            if factory.assignment.is_empty() {
                continue;
            }
            let scenarios: Vec<&String> = factory.assignment.keys().collect();
            pipe.cmd("SADD").arg(&factory_key).arg(scenarios).ignore();
            nodes.push(node_id);
        }
        if !nodes.is_empty() {
            pipe.cmd("SADD").arg(&feedback_key).arg(nodes).ignore();
        }

        let mut connection = self.connection.clone();
        let _: () = pipe.query_async(&mut connection).await.map_err(backend)?;
        Ok(())
    }

    async fn mark_feedback_for_factory(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
    ) -> Result<bool, StoreError> {
        self.remove_member(&keys::feedback(tenant, campaign_key), node_id)
            .await
    }

    async fn mark_feedback_for_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<bool, StoreError> {
        self.remove_member(&keys::feedback(tenant, campaign_key), scenario)
            .await
    }

    async fn mark_feedback_for_factory_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
        scenario: &str,
    ) -> Result<bool, StoreError> {
        let factory_key = keys::factory_feedback(tenant, campaign_key, node_id);
        if !self.remove_member(&factory_key, scenario).await? {
            return Ok(false);
        }
        self.remove_member(&keys::feedback(tenant, campaign_key), node_id)
            .await
    }

    async fn clean(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut command = redis::cmd("UNLINK");
        command
            .arg(keys::campaign(&campaign.tenant, &campaign.key))
            .arg(keys::feedback(&campaign.tenant, &campaign.key));
        for node_id in campaign.factories.keys() {
            command.arg(keys::factory_feedback(&campaign.tenant, &campaign.key, node_id));
        }
        let mut connection = self.connection.clone();
        let removed: i64 = command.query_async(&mut connection).await.map_err(backend)?;
        tracing::debug!(campaign = %campaign.key, removed, "campaign keys unlinked");
        Ok(())
    }

    fn is_distributed(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
pub(crate) mod tests;
