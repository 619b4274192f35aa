// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::tests::{campaign, Head};
use cm_core::{CampaignStore, Phase, PhaseLabel, StoreError};

#[tokio::test]
async fn absent_campaign_resolves_to_no_campaign() {
    let head = Head::new();

    let state = resolve(&head.context, "my-tenant", "my-campaign").await.unwrap();

    assert_eq!(state.phase(), &Phase::NoCampaign);
    assert!(state.is_completed());
}

#[tokio::test]
async fn persisted_campaign_is_rebuilt_initialized() {
    let head = Head::new();
    head.store.save_configuration(&campaign()).await.unwrap();
    head.store
        .set_phase("my-tenant", "my-campaign", PhaseLabel::Warmup)
        .await
        .unwrap();

    let mut state = resolve(&head.context, "my-tenant", "my-campaign").await.unwrap();

    assert_eq!(state.phase(), &Phase::Warmup);
    assert!(state.is_initialized());
    assert!(state.init().await.unwrap().is_empty());
    assert_eq!(state.campaign(), &campaign());
}

#[tokio::test]
async fn configuration_without_phase_is_unresolvable() {
    let head = Head::new();
    head.store.save_configuration(&campaign()).await.unwrap();

    let result = resolve(&head.context, "my-tenant", "my-campaign").await;

    assert!(matches!(
        result,
        Err(ExecutorError::Store(StoreError::UnresolvablePhase { .. }))
    ));
}
