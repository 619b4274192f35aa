// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn two_factory_campaign() -> Campaign {
    Campaign::new("my-tenant", "my-campaign")
        .with_scenario("scenario-1", 10)
        .with_scenario("scenario-2", 5)
        .with_factory(
            "node-1",
            FactoryConfiguration::new("unicast-1")
                .with_scenario("scenario-1", &["dag-1", "dag-2"])
                .with_scenario("scenario-2", &["dag-a"]),
        )
        .with_factory(
            "node-2",
            FactoryConfiguration::new("unicast-2").with_scenario("scenario-2", &["dag-a", "dag-b"]),
        )
}

#[test]
fn unassign_factory_removes_all_its_assignments() {
    let mut campaign = two_factory_campaign();

    assert!(campaign.unassign_factory("node-1"));
    assert!(!campaign.contains("node-1"));
    assert!(!campaign.unassign_factory("node-1"));
    assert_eq!(campaign.node_ids(), vec!["node-2".to_string()]);
}

#[parameterized(
    keeps_factory_with_other_scenarios = { "scenario-1", "node-1", true, false },
    drops_factory_without_scenarios = { "scenario-2", "node-2", false, true },
    unknown_scenario_is_harmless = { "scenario-3", "node-2", true, false },
    unknown_factory_is_harmless = { "scenario-1", "node-3", false, false },
)]
fn unassign_scenario_of_factory(scenario: &str, node: &str, still_contained: bool, dropped: bool) {
    let mut campaign = two_factory_campaign();

    assert_eq!(campaign.unassign_scenario_of_factory(scenario, node), dropped);

    assert_eq!(campaign.contains(node), still_contained);
    if let Some(factory) = campaign.factories.get(node) {
        assert!(!factory.assignment.contains_key(scenario));
    }
}

#[test]
fn dropping_a_factory_is_reported_once() {
    let mut campaign = two_factory_campaign();

    assert!(campaign.is_assigned("node-2", "scenario-2"));
    assert!(campaign.unassign_scenario_of_factory("scenario-2", "node-2"));
    assert!(!campaign.is_assigned("node-2", "scenario-2"));
    assert!(!campaign.unassign_scenario_of_factory("scenario-2", "node-2"));
}

#[test]
fn configuration_defaults_apply_when_deserializing() {
    let json = r#"{
        "tenant": "my-tenant",
        "key": "my-campaign",
        "scenarios": {"scenario-1": {"minions_count": 3}},
        "factories": {"node-1": {
            "unicast_channel": "unicast-1",
            "assignment": {"scenario-1": {"scenario_name": "scenario-1", "dags": ["dag-1"]}}
        }}
    }"#;

    let campaign: Campaign = serde_json::from_str(json).unwrap();

    assert_eq!(campaign.speed_factor, 1.0);
    assert_eq!(campaign.launch_sequence, LaunchSequence::Prepared);
    assert_eq!(
        campaign.factories["node-1"].assignment["scenario-1"].maximal_minions_count,
        u32::MAX
    );
    assert!(campaign.abort.is_none());
}

#[test]
fn execution_status_displays_as_persisted_label() {
    assert_eq!(ExecutionStatus::Aborted.to_string(), "ABORTED");
    assert_eq!(
        serde_json::to_string(&ExecutionStatus::InProgress).unwrap(),
        "\"IN_PROGRESS\""
    );
}
