// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Head lifecycle management: wiring, inbound messages, shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use cm_adapters::{
    InMemoryReportStateKeeper, LoggingReportPublisher, NoOpCampaignService, NoOpFactoryService,
    StdoutHeadChannel, TracedFactoryService, TracedHeadChannel,
};
use cm_core::{
    Campaign, CampaignExecutionContext, CampaignStore, DelayedFeedbackManager, Feedback,
    HeadChannel, InMemoryCampaignStore, LaunchSequence, SystemClock, UuidIdGen,
};
use cm_engine::{
    CampaignExecutor, ExecutorConfig, ExecutorError, InMemoryDelayedFeedbackManager,
    LoopbackFeedbackChannel,
};
use cm_storage::{
    RedisCampaignStore, RedisDelayedFeedbackManager, RedisHeadChannel, RedisStoreError,
    RedisSubscription,
};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::HeadConfig;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine log directory")]
    NoLogDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] RedisStoreError),

    #[error("Unreadable message: {0}")]
    Message(#[from] serde_json::Error),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Commands of the operators, next to the feedbacks of the factories
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HeadCommand {
    Start {
        campaign: Campaign,
        /// Overrides the launch sequence configured for the head
        #[serde(default)]
        launch_sequence: Option<LaunchSequence>,
    },
    Abort {
        tenant: String,
        campaign_key: String,
        aborter: String,
        #[serde(default)]
        hard: bool,
    },
}

/// A message received by the head
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Command(HeadCommand),
    Feedback(Feedback),
}

impl Inbound {
    pub fn parse(payload: &str) -> Result<Self, LifecycleError> {
        Ok(serde_json::from_str(payload)?)
    }
}

type LineReader = Lines<Box<dyn AsyncBufRead + Unpin + Send>>;

enum Source {
    /// JSON lines on a reader, plus the feedbacks the head schedules for itself
    Standalone {
        lines: Option<LineReader>,
        loopback: mpsc::UnboundedReceiver<Feedback>,
    },
    Cluster { subscription: RedisSubscription },
}

/// Head state during operation
pub struct Head {
    pub config: HeadConfig,
    pub executor: CampaignExecutor,
    source: Source,
    /// Background task publishing delayed feedbacks
    poller: Option<JoinHandle<()>>,
    // NOTE(lifetime): Owns the publishing task of standalone delayed feedbacks
    #[allow(dead_code)]
    delayed: Option<Arc<InMemoryDelayedFeedbackManager>>,
}

impl Head {
    /// Next inbound message; `None` once no message can arrive anymore
    pub async fn next_inbound(&mut self) -> Option<Result<Inbound, LifecycleError>> {
        match &mut self.source {
            Source::Standalone { lines, loopback } => loop {
                let Some(reader) = lines.as_mut() else {
                    return loopback.recv().await.map(|feedback| Ok(Inbound::Feedback(feedback)));
                };
                let line = tokio::select! {
                    Some(feedback) = loopback.recv() => return Some(Ok(Inbound::Feedback(feedback))),
                    line = reader.next_line() => line,
                };
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => return Some(Inbound::parse(&line)),
                    Ok(None) => {
                        info!("input closed");
                        *lines = None;
                    }
                    Err(e) => return Some(Err(e.into())),
                }
            },
            Source::Cluster { subscription } => {
                let (channel, payload) = subscription.next_message().await?;
                tracing::trace!(channel, "message received");
                Some(Inbound::parse(&payload))
            }
        }
    }

    /// Hand a message to the executor
    pub async fn handle(&self, inbound: Inbound) -> Result<(), LifecycleError> {
        match inbound {
            Inbound::Feedback(feedback) => self.executor.notify(feedback).await?,
            Inbound::Command(HeadCommand::Start {
                mut campaign,
                launch_sequence,
            }) => {
                campaign.launch_sequence = launch_sequence.unwrap_or(self.config.launch_sequence);
                self.executor.start(campaign).await?
            }
            Inbound::Command(HeadCommand::Abort {
                tenant,
                campaign_key,
                aborter,
                hard,
            }) => {
                self.executor
                    .abort(&tenant, &aborter, &campaign_key, hard)
                    .await?
            }
        }
        Ok(())
    }

    /// Shutdown the head gracefully
    pub async fn shutdown(&mut self) {
        info!("Shutting down head...");

        if let Some(poller) = self.poller.take() {
            poller.abort();
        }

        let running = self.executor.running().await;
        if running > 0 {
            if self.config.is_clustered() {
                info!(running, "campaigns left to the other heads");
            } else {
                warn!(running, "campaigns still running are lost");
            }
        }

        info!("Head shutdown complete");
    }
}

/// Start the head described by `config`, reading standalone input from stdin
pub async fn startup(config: &HeadConfig) -> Result<Head, LifecycleError> {
    match &config.redis_url {
        Some(url) => cluster(config, url).await,
        None => {
            let reader: Box<dyn AsyncBufRead + Unpin + Send> =
                Box::new(BufReader::new(tokio::io::stdin()));
            let channel = TracedHeadChannel::new(StdoutHeadChannel::new());
            Ok(standalone(config, reader, Arc::new(channel)))
        }
    }
}

/// Head keeping its campaigns in memory
pub fn standalone(
    config: &HeadConfig,
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    channel: Arc<dyn HeadChannel>,
) -> Head {
    let (loopback_tx, loopback) = mpsc::unbounded_channel();
    let delayed = Arc::new(InMemoryDelayedFeedbackManager::new(
        Arc::new(LoopbackFeedbackChannel::new(loopback_tx)),
        Arc::new(UuidIdGen),
    ));

    let executor = executor(
        config,
        Arc::new(InMemoryCampaignStore::new()),
        channel,
        delayed.clone(),
    );

    info!("Head started alone");

    Head {
        config: config.clone(),
        executor,
        source: Source::Standalone {
            lines: Some(reader.lines()),
            loopback,
        },
        poller: None,
        delayed: Some(delayed),
    }
}

/// Head sharing its campaigns with the other heads through Redis
async fn cluster(config: &HeadConfig, url: &str) -> Result<Head, LifecycleError> {
    let connection = cm_storage::connect(url).await?;
    let channel = RedisHeadChannel::new(connection.clone());

    let delayed = Arc::new(RedisDelayedFeedbackManager::new(
        connection.clone(),
        Arc::new(channel.clone()),
        Arc::new(UuidIdGen),
        Arc::new(SystemClock),
    ));
    let poller = delayed.clone().spawn_poller(config.delayed_poll_interval);

    let executor = executor(
        config,
        Arc::new(RedisCampaignStore::new(connection)),
        Arc::new(TracedHeadChannel::new(channel)),
        delayed,
    );

    let channels = [config.feedback_channel.clone(), config.command_channel.clone()];
    let subscription = cm_storage::subscribe(url, &channels).await?;

    info!(
        feedback_channel = %config.feedback_channel,
        command_channel = %config.command_channel,
        "Head joined the cluster"
    );

    Ok(Head {
        config: config.clone(),
        executor,
        source: Source::Cluster { subscription },
        poller: Some(poller),
        delayed: None,
    })
}

fn executor(
    config: &HeadConfig,
    store: Arc<dyn CampaignStore>,
    channel: Arc<dyn HeadChannel>,
    delayed: Arc<dyn DelayedFeedbackManager>,
) -> CampaignExecutor {
    let context = Arc::new(CampaignExecutionContext {
        campaign_service: Arc::new(NoOpCampaignService::new()),
        factory_service: Arc::new(TracedFactoryService::new(NoOpFactoryService::new())),
        report_state_keeper: Arc::new(InMemoryReportStateKeeper::new()),
        head_channel: channel,
        report_publishers: vec![Arc::new(LoggingReportPublisher::new())],
        store,
        delayed_feedback_manager: delayed,
        clock: Arc::new(SystemClock),
        abort_grace_period: config.abort_grace_period,
    });
    CampaignExecutor::new(
        context,
        ExecutorConfig {
            broadcast_channel: config.broadcast_channel.clone(),
            feedback_channel: config.feedback_channel.clone(),
        },
    )
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
