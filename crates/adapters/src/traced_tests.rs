// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cm_core::adapters::{FactoryCall, FakeFactoryService, FakeHeadChannel};
use cm_core::DirectiveKind;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn directive(channel: &str) -> Directive {
    Directive {
        tenant: "my-tenant".to_string(),
        campaign_key: "my-campaign".to_string(),
        channel: channel.to_string(),
        kind: DirectiveKind::ScenarioWarmUp {
            scenario_name: "scenario-1".to_string(),
        },
    }
}

fn campaign() -> Campaign {
    Campaign::new("my-tenant", "my-campaign")
}

// =============================================================================
// Precondition validation tests
// =============================================================================

#[tokio::test]
async fn traced_channel_rejects_unaddressed_directive() {
    let fake = FakeHeadChannel::new();
    let traced = TracedHeadChannel::new(fake.clone());

    let result = traced.publish_directive(&directive("")).await;

    let err = result.unwrap_err();
    assert!(
        err.to_string().contains("has no channel"),
        "Expected error about the channel, got: {}",
        err
    );
    assert!(fake.directives().is_empty());
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_channel_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedHeadChannel::new(FakeHeadChannel::new());
        traced.publish_directive(&directive("unicast-1")).await
    });

    assert!(result.is_ok(), "publish should succeed: {:?}", result);
    assert!(
        logs.contains("directive.publish"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("unicast-1"),
        "Should log the channel. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("scenario_warm_up"),
        "Should log the directive. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_channel_logs_precondition_failure() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedHeadChannel::new(FakeHeadChannel::new());
        traced.publish_directive(&directive("")).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("directive has no channel"),
        "Should log precondition failure. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_factories_log_release_and_health() {
    let (logs, _) = with_tracing(|| async {
        let fake = FakeFactoryService::new();
        fake.set_state("node-2", FactoryState::Offline);
        let traced = TracedFactoryService::new(fake);
        let nodes = vec!["node-1".to_string(), "node-2".to_string()];

        traced.release_factories(&campaign(), &nodes).await.unwrap();
        traced.get_factories_health("my-tenant", &nodes).await
    });

    assert!(
        logs.contains("factories.release"),
        "Should log release span. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("factories released"),
        "Should log release completion. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("unhealthy=1"),
        "Should count unhealthy factories. Logs:\n{}",
        logs
    );
}

// =============================================================================
// Delegation tests - verify traced wrapper delegates to inner adapter
// =============================================================================

#[tokio::test]
async fn traced_channel_delegates_to_inner() {
    let fake = FakeHeadChannel::new();
    let traced = TracedHeadChannel::new(fake.clone());

    traced.publish_directive(&directive("unicast-1")).await.unwrap();

    assert_eq!(fake.directives(), vec![directive("unicast-1")]);
}

#[tokio::test]
async fn traced_factories_delegate_to_inner() {
    let fake = FakeFactoryService::new();
    fake.set_state("node-1", FactoryState::Unhealthy);
    let traced = TracedFactoryService::new(fake.clone());
    let nodes = vec!["node-1".to_string()];

    let health = traced.get_factories_health("my-tenant", &nodes).await.unwrap();
    traced.release_factories(&campaign(), &nodes).await.unwrap();

    assert_eq!(health[0].state, FactoryState::Unhealthy);
    match &fake.calls()[..] {
        [FactoryCall::Health { tenant, .. }, FactoryCall::Release { campaign_key, node_ids }] => {
            assert_eq!(tenant, "my-tenant");
            assert_eq!(campaign_key, "my-campaign");
            assert_eq!(node_ids, &nodes);
        }
        other => panic!("Expected Health then Release, got {:?}", other),
    }
}
