// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn every_factory_is_idle() {
    let service = NoOpFactoryService::new();
    let nodes = vec!["node-1".to_string(), "node-2".to_string()];

    let health = service.get_factories_health("my-tenant", &nodes).await.unwrap();

    assert_eq!(health.len(), 2);
    assert!(health.iter().all(|factory| factory.state == FactoryState::Idle));
    assert_eq!(health[1].node_id, "node-2");
}

#[tokio::test]
async fn campaign_service_accepts_everything() {
    let service = NoOpCampaignService::new();

    service
        .close("my-tenant", "my-campaign", ExecutionStatus::Failed, Some("boom"))
        .await
        .unwrap();
    service
        .close_scenario("my-tenant", "my-campaign", "scenario-1")
        .await
        .unwrap();
    service.abort("my-tenant", "alice", "my-campaign").await.unwrap();
}
