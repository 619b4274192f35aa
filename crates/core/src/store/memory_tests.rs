// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::campaign::FactoryConfiguration;

fn campaign() -> Campaign {
    Campaign::new("my-tenant", "my-campaign")
        .with_scenario("scenario-1", 10)
        .with_scenario("scenario-2", 10)
        .with_factory(
            "node-1",
            FactoryConfiguration::new("unicast-1")
                .with_scenario("scenario-1", &["dag-1"])
                .with_scenario("scenario-2", &["dag-2"]),
        )
        .with_factory(
            "node-2",
            FactoryConfiguration::new("unicast-2").with_scenario("scenario-2", &["dag-2"]),
        )
}

#[tokio::test]
async fn state_is_absent_until_configuration_is_saved() {
    let store = InMemoryCampaignStore::new();
    let campaign = campaign();

    assert!(store.get_state("my-tenant", "my-campaign").await.unwrap().is_none());

    store.save_configuration(&campaign).await.unwrap();
    let result = store.get_state("my-tenant", "my-campaign").await;
    assert!(matches!(result, Err(StoreError::UnresolvablePhase { .. })));

    store
        .set_phase("my-tenant", "my-campaign", PhaseLabel::Warmup)
        .await
        .unwrap();
    let stored = store.get_state("my-tenant", "my-campaign").await.unwrap().unwrap();
    assert_eq!(stored.phase, PhaseLabel::Warmup);
    assert_eq!(stored.campaign, campaign);
}

#[tokio::test]
async fn factories_are_marked_one_by_one() {
    let store = InMemoryCampaignStore::new();
    let campaign = campaign();
    store
        .prepare_factories_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    assert!(!store
        .mark_feedback_for_factory("my-tenant", "my-campaign", "node-1")
        .await
        .unwrap());
    // Duplicates change nothing
    assert!(!store
        .mark_feedback_for_factory("my-tenant", "my-campaign", "node-1")
        .await
        .unwrap());
    assert!(store
        .mark_feedback_for_factory("my-tenant", "my-campaign", "node-2")
        .await
        .unwrap());
}

#[tokio::test]
async fn scenarios_replace_previous_expectations() {
    let store = InMemoryCampaignStore::new();
    let campaign = campaign();
    store
        .prepare_factories_for_feedback_expectations(&campaign)
        .await
        .unwrap();
    store
        .prepare_scenarios_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    assert_eq!(
        store.expected("my-tenant", "my-campaign").into_iter().collect::<Vec<_>>(),
        vec!["scenario-1".to_string(), "scenario-2".to_string()]
    );
    assert!(!store
        .mark_feedback_for_scenario("my-tenant", "my-campaign", "scenario-2")
        .await
        .unwrap());
    assert!(store
        .mark_feedback_for_scenario("my-tenant", "my-campaign", "scenario-1")
        .await
        .unwrap());
}

#[tokio::test]
async fn factory_leaves_expectations_with_its_last_scenario() {
    let store = InMemoryCampaignStore::new();
    let campaign = campaign();
    store
        .prepare_assignments_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    assert!(!store
        .mark_feedback_for_factory_scenario("my-tenant", "my-campaign", "node-1", "scenario-2")
        .await
        .unwrap());
    assert!(store
        .expected("my-tenant", "my-campaign")
        .contains("node-1"));

    assert!(!store
        .mark_feedback_for_factory_scenario("my-tenant", "my-campaign", "node-1", "scenario-1")
        .await
        .unwrap());
    assert!(!store
        .expected("my-tenant", "my-campaign")
        .contains("node-1"));

    // Late report of a factory already done
    assert!(!store
        .mark_feedback_for_factory_scenario("my-tenant", "my-campaign", "node-1", "scenario-1")
        .await
        .unwrap());

    assert!(store
        .mark_feedback_for_factory_scenario("my-tenant", "my-campaign", "node-2", "scenario-2")
        .await
        .unwrap());
}

#[tokio::test]
async fn clean_forgets_the_campaign() {
    let store = InMemoryCampaignStore::new();
    let campaign = campaign();
    store.save_configuration(&campaign).await.unwrap();
    store
        .prepare_factories_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    store.clean(&campaign).await.unwrap();

    assert!(!store.contains("my-tenant", "my-campaign"));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn assigned_campaign(assignments: &[(u8, u8)]) -> Campaign {
        let mut campaign = Campaign::new("t", "c");
        for (node, scenario) in assignments {
            let node = format!("node-{node}");
            let scenario = format!("scenario-{scenario}");
            let factory = campaign
                .factories
                .remove(&node)
                .unwrap_or_else(|| FactoryConfiguration::new(format!("unicast-{node}")));
            campaign = campaign.with_factory(node, factory.with_scenario(scenario, &["dag"]));
        }
        campaign
    }

    proptest! {
        #[test]
        fn satisfied_exactly_when_every_assignment_is_acknowledged(
            assignments in proptest::collection::vec((0u8..4, 0u8..4), 1..12),
            seed in any::<u64>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let campaign = assigned_campaign(&assignments);
            let store = InMemoryCampaignStore::new();
            runtime.block_on(store.prepare_assignments_for_feedback_expectations(&campaign)).unwrap();

            let mut pending: Vec<(String, String)> = campaign
                .factories
                .iter()
                .flat_map(|(node, f)| f.assignment.keys().map(move |s| (node.clone(), s.clone())))
                .collect();
            // Deterministic shuffle, with every acknowledgement delivered twice
            pending.sort_by_key(|(n, s)| (seed ^ (n.len() as u64 * 31 + s.len() as u64)).rotate_left(s.len() as u32));
            let deliveries: Vec<_> = pending.iter().chain(pending.iter()).cloned().collect();

            let mut acknowledged = BTreeSet::new();
            let mut previous_expected = store.expected("t", "c");
            for (node, scenario) in deliveries {
                let satisfied = runtime
                    .block_on(store.mark_feedback_for_factory_scenario("t", "c", &node, &scenario))
                    .unwrap();
                acknowledged.insert((node, scenario));

                let expected = store.expected("t", "c");
                prop_assert!(expected.is_subset(&previous_expected));
                prop_assert_eq!(satisfied, expected.is_empty());
                prop_assert_eq!(expected.is_empty(), acknowledged.len() == pending.len());
                previous_expected = expected;
            }
        }
    }
}
