// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced collaborator wrappers for consistent observability

use async_trait::async_trait;
use cm_core::{
    Campaign, ChannelError, Directive, FactoryHealth, FactoryService, FactoryState, HeadChannel,
    NodeId, ServiceError,
};

/// Wrapper that adds tracing to any HeadChannel
#[derive(Clone)]
pub struct TracedHeadChannel<C> {
    inner: C,
}

impl<C> TracedHeadChannel<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: HeadChannel> HeadChannel for TracedHeadChannel<C> {
    async fn publish_directive(&self, directive: &Directive) -> Result<(), ChannelError> {
        let span = tracing::info_span!(
            "directive.publish",
            campaign = %directive.campaign_key,
            channel = %directive.channel,
        );
        let _guard = span.enter();

        tracing::info!(directive = directive.name(), "publishing");

        // Precondition: the directive must be addressed
        if directive.channel.is_empty() {
            tracing::error!("directive has no channel");
            return Err(ChannelError::PublishFailed {
                channel: String::new(),
                message: format!("directive {} has no channel", directive.name()),
            });
        }

        let start = std::time::Instant::now();
        let result = self.inner.publish_directive(directive).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "published"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "publish failed"
            ),
        }

        result
    }
}

/// Wrapper that adds tracing to any FactoryService
#[derive(Clone)]
pub struct TracedFactoryService<F> {
    inner: F,
}

impl<F> TracedFactoryService<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: FactoryService> FactoryService for TracedFactoryService<F> {
    async fn release_factories(
        &self,
        campaign: &Campaign,
        node_ids: &[NodeId],
    ) -> Result<(), ServiceError> {
        let span = tracing::info_span!("factories.release", campaign = %campaign.key);
        let _guard = span.enter();

        let result = self.inner.release_factories(campaign, node_ids).await;
        match &result {
            Ok(()) => tracing::info!(nodes = ?node_ids, "factories released"),
            // Factories not released stay busy until the registry expires them
            Err(e) => tracing::warn!(nodes = ?node_ids, error = %e, "release failed"),
        }

        result
    }

    async fn get_factories_health(
        &self,
        tenant: &str,
        node_ids: &[NodeId],
    ) -> Result<Vec<FactoryHealth>, ServiceError> {
        let span = tracing::info_span!("factories.health", tenant);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self.inner.get_factories_health(tenant, node_ids).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(health) => {
                let unhealthy = health
                    .iter()
                    .filter(|factory| factory.state != FactoryState::Idle)
                    .count();
                tracing::debug!(
                    checked = health.len(),
                    unhealthy,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "health checked"
                );
            }
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "health check failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
