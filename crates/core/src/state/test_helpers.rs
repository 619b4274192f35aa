// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the state machine tests

use super::*;
use crate::adapters::{
    FakeCampaignService, FakeDelayedFeedbackManager, FakeFactoryService, FakeHeadChannel,
    FakeReportPublisher, FakeReportStateKeeper,
};
use crate::campaign::FactoryConfiguration;
use crate::clock::FakeClock;
use crate::store::InMemoryCampaignStore;
use std::time::Duration;

pub const TENANT: &str = "my-tenant";
pub const CAMPAIGN: &str = "my-campaign";

/// Context wired to recording fakes
pub struct Harness {
    pub campaign_service: FakeCampaignService,
    pub factory_service: FakeFactoryService,
    pub report_state_keeper: FakeReportStateKeeper,
    pub report_publisher: FakeReportPublisher,
    pub delayed_feedback_manager: FakeDelayedFeedbackManager,
    pub store: Arc<InMemoryCampaignStore>,
    pub clock: FakeClock,
    pub context: Arc<CampaignExecutionContext>,
}

impl Harness {
    pub fn new() -> Self {
        let campaign_service = FakeCampaignService::new();
        let factory_service = FakeFactoryService::new();
        let report_state_keeper = FakeReportStateKeeper::new();
        let report_publisher = FakeReportPublisher::new();
        let delayed_feedback_manager = FakeDelayedFeedbackManager::new();
        let store = Arc::new(InMemoryCampaignStore::new());
        let clock = FakeClock::new();
        let context = Arc::new(CampaignExecutionContext {
            campaign_service: Arc::new(campaign_service.clone()),
            factory_service: Arc::new(factory_service.clone()),
            report_state_keeper: Arc::new(report_state_keeper.clone()),
            head_channel: Arc::new(FakeHeadChannel::new()),
            report_publishers: vec![Arc::new(report_publisher.clone())],
            store: store.clone(),
            delayed_feedback_manager: Arc::new(delayed_feedback_manager.clone()),
            clock: Arc::new(clock.clone()),
            abort_grace_period: Duration::from_secs(10),
        });
        Self {
            campaign_service,
            factory_service,
            report_state_keeper,
            report_publisher,
            delayed_feedback_manager,
            store,
            clock,
            context,
        }
    }

    /// Injected, not yet initialized state
    pub fn state(&self, campaign: Campaign, phase: Phase) -> CampaignExecutionState {
        let mut state = CampaignExecutionState::in_phase(campaign, phase);
        state.inject(self.context.clone());
        state
    }

    /// Initialized state with the directives it emitted
    pub async fn enter(
        &self,
        campaign: Campaign,
        phase: Phase,
    ) -> (CampaignExecutionState, Vec<Directive>) {
        let mut state = self.state(campaign, phase);
        let directives = state.init().await.unwrap();
        (state, directives)
    }

    pub fn expected(&self) -> Vec<String> {
        self.store.expected(TENANT, CAMPAIGN).into_iter().collect()
    }
}

/// node-1 runs scenario-1 and scenario-2, node-2 runs scenario-2
pub fn campaign() -> Campaign {
    Campaign {
        broadcast_channel: "directives-broadcast".to_string(),
        feedback_channel: "feedbacks".to_string(),
        ..Campaign::new(TENANT, CAMPAIGN)
            .with_scenario("scenario-1", 10)
            .with_scenario("scenario-2", 20)
            .with_factory(
                "node-1",
                FactoryConfiguration::new("unicast-node-1")
                    .with_scenario("scenario-1", &["dag-1", "dag-2"])
                    .with_scenario("scenario-2", &["dag-a"]),
            )
            .with_factory(
                "node-2",
                FactoryConfiguration::new("unicast-node-2").with_scenario("scenario-2", &["dag-a"]),
            )
    }
}

pub fn feedback(node: &str, status: FeedbackStatus, kind: FeedbackKind) -> Feedback {
    Feedback::new(TENANT, CAMPAIGN, node, status, kind)
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
