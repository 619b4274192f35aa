// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs against the server named by `CM_TEST_REDIS_URL`; skipped without it

use super::*;
use cm_core::adapters::{
    FakeCampaignService, FakeDelayedFeedbackManager, FakeFactoryService, FakeHeadChannel,
    FakeReportPublisher, FakeReportStateKeeper,
};
use cm_core::{
    CampaignExecutionContext, CampaignExecutionState, FactoryConfiguration, FakeClock, Feedback,
    FeedbackKind, FeedbackStatus, Phase, DEFAULT_ABORT_GRACE_PERIOD,
};
use std::sync::Arc;

pub(crate) const REDIS_URL_VAR: &str = "CM_TEST_REDIS_URL";

pub(crate) async fn connect() -> Option<RedisCampaignStore> {
    let url = std::env::var(REDIS_URL_VAR).ok()?;
    Some(RedisCampaignStore::connect(&url).await.unwrap())
}

/// Keys unique to the test so that runs do not collide
fn campaign(test: &str) -> Campaign {
    Campaign::new(format!("tenant-{}", std::process::id()), test)
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
async fn configuration_and_label_are_read_back() {
    let Some(store) = connect().await else { return };
    let campaign = campaign("read-back");
    let (tenant, key) = (campaign.tenant.clone(), campaign.key.clone());
    store.clean(&campaign).await.unwrap();

    assert!(store.get_state(&tenant, &key).await.unwrap().is_none());

    store.save_configuration(&campaign).await.unwrap();
    let result = store.get_state(&tenant, &key).await;
    assert!(matches!(result, Err(StoreError::UnresolvablePhase { .. })));

    store.set_phase(&tenant, &key, PhaseLabel::MinionsStartup).await.unwrap();
    let stored = store.get_state(&tenant, &key).await.unwrap().unwrap();
    assert_eq!(stored.phase, PhaseLabel::MinionsStartup);
    assert_eq!(stored.campaign, campaign);

    store.clean(&campaign).await.unwrap();
    assert!(store.get_state(&tenant, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_label_is_unresolvable() {
    let Some(store) = connect().await else { return };
    let campaign = campaign("unknown-label");
    store.save_configuration(&campaign).await.unwrap();

    let mut connection = store.connection.clone();
    let _: i64 = redis::cmd("HSET")
        .arg(keys::campaign(&campaign.tenant, &campaign.key))
        .arg(keys::STATE_FIELD)
        .arg("SomethingElse")
        .query_async(&mut connection)
        .await
        .unwrap();

    let result = store.get_state(&campaign.tenant, &campaign.key).await;
    assert!(
        matches!(result, Err(StoreError::UnresolvablePhase { ref label, .. }) if label == "SomethingElse")
    );
    store.clean(&campaign).await.unwrap();
}

#[tokio::test]
async fn factories_are_marked_until_none_is_left() {
    let Some(store) = connect().await else { return };
    let campaign = campaign("factories");
    let (tenant, key) = (campaign.tenant.as_str(), campaign.key.as_str());
    store
        .prepare_factories_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    assert!(!store.mark_feedback_for_factory(tenant, key, "node-1").await.unwrap());
    assert!(!store.mark_feedback_for_factory(tenant, key, "node-1").await.unwrap());
    assert!(store.mark_feedback_for_factory(tenant, key, "node-2").await.unwrap());
    store.clean(&campaign).await.unwrap();
}

#[tokio::test]
async fn scenarios_replace_factory_expectations() {
    let Some(store) = connect().await else { return };
    let campaign = campaign("scenarios");
    let (tenant, key) = (campaign.tenant.as_str(), campaign.key.as_str());
    store
        .prepare_factories_for_feedback_expectations(&campaign)
        .await
        .unwrap();
    store
        .prepare_scenarios_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    // Factories are no longer expected
    assert!(!store.mark_feedback_for_factory(tenant, key, "node-1").await.unwrap());
    assert!(!store.mark_feedback_for_scenario(tenant, key, "scenario-1").await.unwrap());
    assert!(store.mark_feedback_for_scenario(tenant, key, "scenario-2").await.unwrap());
    store.clean(&campaign).await.unwrap();
}

#[tokio::test]
async fn factory_is_done_with_its_last_scenario() {
    let Some(store) = connect().await else { return };
    let campaign = campaign("assignments");
    let (tenant, key) = (campaign.tenant.as_str(), campaign.key.as_str());
    store
        .prepare_assignments_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    assert!(!store
        .mark_feedback_for_factory_scenario(tenant, key, "node-1", "scenario-1")
        .await
        .unwrap());
    assert!(!store
        .mark_feedback_for_factory_scenario(tenant, key, "node-2", "scenario-2")
        .await
        .unwrap());
    assert!(store
        .mark_feedback_for_factory_scenario(tenant, key, "node-1", "scenario-2")
        .await
        .unwrap());
    store.clean(&campaign).await.unwrap();
}

#[tokio::test]
async fn clean_unlinks_every_key_of_the_campaign() {
    let Some(store) = connect().await else { return };
    let campaign = campaign("clean");
    store.save_configuration(&campaign).await.unwrap();
    store
        .prepare_assignments_for_feedback_expectations(&campaign)
        .await
        .unwrap();

    store.clean(&campaign).await.unwrap();

    let mut connection = store.connection.clone();
    let existing: i64 = redis::cmd("EXISTS")
        .arg(keys::campaign(&campaign.tenant, &campaign.key))
        .arg(keys::feedback(&campaign.tenant, &campaign.key))
        .arg(keys::factory_feedback(&campaign.tenant, &campaign.key, "node-1"))
        .arg(keys::factory_feedback(&campaign.tenant, &campaign.key, "node-2"))
        .query_async(&mut connection)
        .await
        .unwrap();
    assert_eq!(existing, 0);
}

#[tokio::test]
async fn store_is_shared_between_heads() {
    let Some(store) = connect().await else { return };
    assert!(store.is_distributed());
}

/// Context of one head over the shared store, every other collaborator faked
fn head(store: Arc<RedisCampaignStore>) -> Arc<CampaignExecutionContext> {
    Arc::new(CampaignExecutionContext {
        campaign_service: Arc::new(FakeCampaignService::new()),
        factory_service: Arc::new(FakeFactoryService::new()),
        report_state_keeper: Arc::new(FakeReportStateKeeper::new()),
        head_channel: Arc::new(FakeHeadChannel::new()),
        report_publishers: vec![Arc::new(FakeReportPublisher::new())],
        store,
        delayed_feedback_manager: Arc::new(FakeDelayedFeedbackManager::new()),
        clock: Arc::new(FakeClock::new()),
        abort_grace_period: DEFAULT_ABORT_GRACE_PERIOD,
    })
}

fn assignment_done(campaign: &Campaign, node: &str) -> Feedback {
    Feedback::new(
        campaign.tenant.clone(),
        campaign.key.clone(),
        node,
        FeedbackStatus::Completed,
        FeedbackKind::FactoryAssignment,
    )
}

#[tokio::test]
async fn factory_assignment_is_completed_across_heads() {
    let Some(store) = connect().await else { return };
    let store = Arc::new(store);
    let campaign = Campaign::new(format!("tenant-{}", std::process::id()), "across-heads")
        .with_scenario("scenario-1", 10)
        .with_factory(
            "f1",
            FactoryConfiguration::new("unicast-1").with_scenario("scenario-1", &["dag-1"]),
        )
        .with_factory(
            "f2",
            FactoryConfiguration::new("unicast-2").with_scenario("scenario-1", &["dag-1"]),
        );
    store.clean(&campaign).await.unwrap();

    let mut first = CampaignExecutionState::new(campaign.clone());
    first.inject(head(store.clone()));
    let directives = first.init().await.unwrap();
    assert_eq!(directives.len(), 2);

    let first = first.process(&assignment_done(&campaign, "f1")).await.unwrap();
    assert_eq!(first.phase(), &Phase::FactoryAssignment);

    // Another head resumes from what the first one persisted
    let stored = store
        .get_state(&campaign.tenant, &campaign.key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.phase, PhaseLabel::FactoryDagsAssignment);
    let second = CampaignExecutionState::rebuild(stored.campaign, stored.phase, head(store.clone()));

    let mut second = second.process(&assignment_done(&campaign, "f2")).await.unwrap();
    assert_eq!(second.phase(), &Phase::MinionsAssignment);
    second.init().await.unwrap();

    let stored = store
        .get_state(&campaign.tenant, &campaign.key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.phase, PhaseLabel::MinionsAssignment);

    store.clean(&campaign).await.unwrap();
}
