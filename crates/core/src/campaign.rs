// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campaign aggregate: scenarios, factories and their assignments

use crate::profile::ExecutionProfileConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Name of a scenario as declared by the factories
pub type ScenarioName = String;

/// Identifier of a factory node
pub type NodeId = String;

/// Final (or current) outcome of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Queued,
    InProgress,
    Successful,
    Failed,
    Aborted,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExecutionStatus::Queued => "QUEUED",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Successful => "SUCCESSFUL",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Aborted => "ABORTED",
        };
        f.write_str(label)
    }
}

/// How an abort should treat in-flight minions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbortConfiguration {
    /// Hard aborts kill running minions and end as a failure
    pub hard: bool,
}

impl AbortConfiguration {
    pub fn hard() -> Self {
        Self { hard: true }
    }

    pub fn soft() -> Self {
        Self { hard: false }
    }
}

/// Order of the phases between minions assignment and running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchSequence {
    /// Warm-up, then ramp-up preparation and start in one phase
    #[default]
    Prepared,
    /// Ramp-up scheduled first, then warm-up; minions start at a fixed instant
    Scheduled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfiguration {
    pub minions_count: u32,
    #[serde(default)]
    pub execution_profile: ExecutionProfileConfiguration,
}

/// DAGs of one scenario executed by a factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryScenarioAssignment {
    pub scenario_name: ScenarioName,
    pub dags: Vec<String>,
    #[serde(default = "unlimited_minions")]
    pub maximal_minions_count: u32,
}

fn unlimited_minions() -> u32 {
    u32::MAX
}

impl FactoryScenarioAssignment {
    pub fn new(scenario_name: impl Into<String>, dags: Vec<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            dags,
            maximal_minions_count: unlimited_minions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfiguration {
    pub unicast_channel: String,
    #[serde(default)]
    pub assignment: BTreeMap<ScenarioName, FactoryScenarioAssignment>,
}

impl FactoryConfiguration {
    pub fn new(unicast_channel: impl Into<String>) -> Self {
        Self {
            unicast_channel: unicast_channel.into(),
            assignment: BTreeMap::new(),
        }
    }

    /// Assign the DAGs of a scenario to the factory
    pub fn with_scenario(mut self, scenario: impl Into<String>, dags: &[&str]) -> Self {
        let scenario = scenario.into();
        let dags = dags.iter().map(|dag| dag.to_string()).collect();
        self.assignment.insert(
            scenario.clone(),
            FactoryScenarioAssignment::new(scenario, dags),
        );
        self
    }
}

/// A load-test execution, owned by the live execution state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Campaign {
    pub tenant: String,
    pub key: String,
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,
    /// Delay between the end of the warm-up and the start of the minions
    #[serde(default, with = "humantime_serde")]
    pub start_offset: Duration,
    pub scenarios: BTreeMap<ScenarioName, ScenarioConfiguration>,
    pub factories: BTreeMap<NodeId, FactoryConfiguration>,
    #[serde(default)]
    pub broadcast_channel: String,
    #[serde(default)]
    pub feedback_channel: String,
    #[serde(default)]
    pub launch_sequence: LaunchSequence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborter: Option<String>,
    /// Set once the campaign is being aborted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortConfiguration>,
}

fn default_speed_factor() -> f64 {
    1.0
}

impl Campaign {
    pub fn new(tenant: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            key: key.into(),
            speed_factor: default_speed_factor(),
            ..Self::default()
        }
    }

    pub fn with_scenario(mut self, name: impl Into<String>, minions_count: u32) -> Self {
        self.scenarios.insert(
            name.into(),
            ScenarioConfiguration {
                minions_count,
                execution_profile: ExecutionProfileConfiguration::default(),
            },
        );
        self
    }

    pub fn with_factory(mut self, node_id: impl Into<String>, factory: FactoryConfiguration) -> Self {
        self.factories.insert(node_id.into(), factory);
        self
    }

    pub fn with_launch_sequence(mut self, sequence: LaunchSequence) -> Self {
        self.launch_sequence = sequence;
        self
    }

    pub fn scenario_names(&self) -> Vec<ScenarioName> {
        self.scenarios.keys().cloned().collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.factories.keys().cloned().collect()
    }

    /// Whether the factory still takes part in the campaign
    pub fn contains(&self, node_id: &str) -> bool {
        self.factories.contains_key(node_id)
    }

    /// Remove a factory and all its assignments; returns whether it was assigned
    pub fn unassign_factory(&mut self, node_id: &str) -> bool {
        self.factories.remove(node_id).is_some()
    }

    /// Remove one scenario from a factory, dropping the factory once it owns nothing.
    ///
    /// Returns whether the factory was dropped by this call.
    pub fn unassign_scenario_of_factory(&mut self, scenario: &str, node_id: &str) -> bool {
        let Some(factory) = self.factories.get_mut(node_id) else {
            return false;
        };
        factory.assignment.remove(scenario);
        if factory.assignment.is_empty() {
            self.factories.remove(node_id);
            return true;
        }
        false
    }

    /// Whether `scenario` is still assigned to the factory `node_id`
    pub fn is_assigned(&self, node_id: &str, scenario: &str) -> bool {
        self.factories
            .get(node_id)
            .is_some_and(|factory| factory.assignment.contains_key(scenario))
    }
}

#[cfg(test)]
#[path = "campaign_tests.rs"]
mod tests;
