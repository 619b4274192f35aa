// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store for a head running alone

use super::{CampaignStore, PhaseLabel, StoreError, StoredCampaign};
use crate::campaign::Campaign;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Entry {
    configuration: Option<Campaign>,
    phase: Option<PhaseLabel>,
    expected: BTreeSet<String>,
    factories: HashMap<String, BTreeSet<String>>,
}

/// Keeps the campaigns of this head in memory, with the same observable
/// semantics as the shared store
#[derive(Debug, Default)]
pub struct InMemoryCampaignStore {
    campaigns: Mutex<HashMap<(String, String), Entry>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<T>(&self, tenant: &str, campaign_key: &str, f: impl FnOnce(&mut Entry) -> T) -> T {
        let mut campaigns = self.campaigns.lock().unwrap_or_else(|e| e.into_inner());
        let entry = campaigns
            .entry((tenant.to_string(), campaign_key.to_string()))
            .or_default();
        f(entry)
    }

    /// Feedbacks still expected for the campaign
    pub fn expected(&self, tenant: &str, campaign_key: &str) -> BTreeSet<String> {
        self.with_entry(tenant, campaign_key, |entry| entry.expected.clone())
    }

    /// Scenarios still expected from one factory
    pub fn expected_for_factory(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
    ) -> BTreeSet<String> {
        self.with_entry(tenant, campaign_key, |entry| {
            entry.factories.get(node_id).cloned().unwrap_or_default()
        })
    }

    pub fn contains(&self, tenant: &str, campaign_key: &str) -> bool {
        let campaigns = self.campaigns.lock().unwrap_or_else(|e| e.into_inner());
        campaigns.contains_key(&(tenant.to_string(), campaign_key.to_string()))
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn save_configuration(&self, campaign: &Campaign) -> Result<(), StoreError> {
        self.with_entry(&campaign.tenant, &campaign.key, |entry| {
            entry.configuration = Some(campaign.clone());
        });
        Ok(())
    }

    async fn set_phase(
        &self,
        tenant: &str,
        campaign_key: &str,
        phase: PhaseLabel,
    ) -> Result<(), StoreError> {
        self.with_entry(tenant, campaign_key, |entry| entry.phase = Some(phase));
        Ok(())
    }

    async fn get_state(
        &self,
        tenant: &str,
        campaign_key: &str,
    ) -> Result<Option<StoredCampaign>, StoreError> {
        let campaigns = self.campaigns.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = campaigns.get(&(tenant.to_string(), campaign_key.to_string())) else {
            return Ok(None);
        };
        let Some(campaign) = entry.configuration.clone() else {
            return Ok(None);
        };
        let phase = entry.phase.ok_or_else(|| StoreError::UnresolvablePhase {
            tenant: tenant.to_string(),
            campaign_key: campaign_key.to_string(),
            label: String::new(),
        })?;
        Ok(Some(StoredCampaign { campaign, phase }))
    }

    async fn prepare_factories_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        self.with_entry(&campaign.tenant, &campaign.key, |entry| {
            entry.expected = campaign.factories.keys().cloned().collect();
        });
        Ok(())
    }

    async fn prepare_scenarios_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        self.with_entry(&campaign.tenant, &campaign.key, |entry| {
            entry.expected = campaign.scenarios.keys().cloned().collect();
        });
        Ok(())
    }

    async fn prepare_assignments_for_feedback_expectations(
        &self,
        campaign: &Campaign,
    ) -> Result<(), StoreError> {
        let assignments: HashMap<String, BTreeSet<String>> = campaign
            .factories
            .iter()
            .filter(|(_, factory)| !factory.assignment.is_empty())
            .map(|(node, factory)| (node.clone(), factory.assignment.keys().cloned().collect()))
            .collect();
        self.with_entry(&campaign.tenant, &campaign.key, |entry| {
            entry.expected = assignments.keys().cloned().collect();
            entry.factories = assignments;
        });
        Ok(())
    }

    async fn mark_feedback_for_factory(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.with_entry(tenant, campaign_key, |entry| {
            entry.expected.remove(node_id);
            entry.expected.is_empty()
        }))
    }

    async fn mark_feedback_for_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.with_entry(tenant, campaign_key, |entry| {
            entry.expected.remove(scenario);
            entry.expected.is_empty()
        }))
    }

    async fn mark_feedback_for_factory_scenario(
        &self,
        tenant: &str,
        campaign_key: &str,
        node_id: &str,
        scenario: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.with_entry(tenant, campaign_key, |entry| {
            if let Some(scenarios) = entry.factories.get_mut(node_id) {
                scenarios.remove(scenario);
                if !scenarios.is_empty() {
                    return false;
                }
                entry.factories.remove(node_id);
            }
            entry.expected.remove(node_id);
            entry.expected.is_empty()
        }))
    }

    async fn clean(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.lock().unwrap_or_else(|e| e.into_inner());
        campaigns.remove(&(campaign.tenant.clone(), campaign.key.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
