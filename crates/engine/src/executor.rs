// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campaign executor: one single-writer actor per running campaign

use crate::{resolve, ExecutorError};
use cm_core::{
    AbortConfiguration, Campaign, CampaignExecutionContext, CampaignExecutionState, Feedback,
    FeedbackKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::Instrument;

/// Channels assigned to campaigns started without their own
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub broadcast_channel: String,
    pub feedback_channel: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            broadcast_channel: "directives-broadcast".to_string(),
            feedback_channel: "feedbacks".to_string(),
        }
    }
}

/// Tenant and key of a campaign
type CampaignId = (String, String);

enum Request {
    Feedback(Feedback),
    Abort {
        aborter: String,
        configuration: AbortConfiguration,
    },
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Feedback(feedback) => feedback.name(),
            Request::Abort { .. } => "abort",
        }
    }
}

struct Command {
    request: Request,
    reply: oneshot::Sender<Result<(), ExecutorError>>,
}

/// Drives campaigns from their start to their end.
///
/// All the messages of one campaign go through a single task owning its
/// state, so a feedback is always folded into the state left by the previous
/// one. Cloning the executor shares its campaigns.
#[derive(Clone)]
pub struct CampaignExecutor {
    context: Arc<CampaignExecutionContext>,
    config: ExecutorConfig,
    actors: Arc<Mutex<HashMap<CampaignId, mpsc::UnboundedSender<Command>>>>,
}

impl CampaignExecutor {
    pub fn new(context: Arc<CampaignExecutionContext>, config: ExecutorConfig) -> Self {
        Self {
            context,
            config,
            actors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a new campaign: factories receive their assignments
    pub async fn start(&self, mut campaign: Campaign) -> Result<(), ExecutorError> {
        if campaign.broadcast_channel.is_empty() {
            campaign.broadcast_channel = self.config.broadcast_channel.clone();
        }
        if campaign.feedback_channel.is_empty() {
            campaign.feedback_channel = self.config.feedback_channel.clone();
        }
        let id = (campaign.tenant.clone(), campaign.key.clone());
        let span = tracing::info_span!("campaign", tenant = %id.0, key = %id.1);

        let mut actors = self.actors.lock().await;
        actors.retain(|_, sender| !sender.is_closed());
        let stored = self.context.store.get_state(&id.0, &id.1).await?;
        if actors.contains_key(&id) || stored.is_some() {
            return Err(ExecutorError::AlreadyRunning {
                tenant: id.0,
                campaign_key: id.1,
            });
        }

        let context = self.context.clone();
        let state = async move {
            tracing::info!(
                scenarios = campaign.scenarios.len(),
                factories = campaign.factories.len(),
                "starting campaign"
            );
            context
                .report_state_keeper
                .start(&campaign.key, &campaign.scenario_names())
                .await?;
            let mut state = CampaignExecutionState::new(campaign);
            state.inject(context.clone());
            settle(&context, state).await
        }
        .instrument(span.clone())
        .await?;

        if !state.is_completed() {
            actors.insert(id, spawn(self.context.clone(), state, span));
        }
        Ok(())
    }

    /// Fold a feedback into the state of its campaign.
    ///
    /// Campaigns this head does not drive yet are resumed from the store.
    pub async fn notify(&self, feedback: Feedback) -> Result<(), ExecutorError> {
        let id = (feedback.tenant.clone(), feedback.campaign_key.clone());
        self.dispatch(id, Request::Feedback(feedback)).await
    }

    /// Abort a campaign on behalf of `aborter`
    pub async fn abort(
        &self,
        tenant: &str,
        aborter: &str,
        campaign_key: &str,
        hard: bool,
    ) -> Result<(), ExecutorError> {
        let id = (tenant.to_string(), campaign_key.to_string());
        let request = Request::Abort {
            aborter: aborter.to_string(),
            configuration: AbortConfiguration { hard },
        };
        self.dispatch(id, request).await
    }

    /// Whether a campaign is driven by this executor
    pub async fn is_running(&self, tenant: &str, campaign_key: &str) -> bool {
        let actors = self.actors.lock().await;
        actors
            .get(&(tenant.to_string(), campaign_key.to_string()))
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Number of campaigns driven by this executor
    pub async fn running(&self) -> usize {
        let actors = self.actors.lock().await;
        actors.values().filter(|sender| !sender.is_closed()).count()
    }

    async fn dispatch(&self, id: CampaignId, request: Request) -> Result<(), ExecutorError> {
        let sender = {
            let mut actors = self.actors.lock().await;
            match actors.get(&id).filter(|sender| !sender.is_closed()) {
                Some(sender) => sender.clone(),
                None => {
                    let state = resolve(&self.context, &id.0, &id.1).await?;
                    if state.is_completed() {
                        return reject(state, request, id).await;
                    }
                    let span = tracing::info_span!("campaign", tenant = %id.0, key = %id.1);
                    span.in_scope(|| tracing::info!(phase = state.phase().name(), "campaign resumed"));
                    let sender = spawn(self.context.clone(), state, span);
                    actors.insert(id.clone(), sender.clone());
                    sender
                }
            }
        };

        let (reply, response) = oneshot::channel();
        let stopped = || ExecutorError::Stopped {
            tenant: id.0.clone(),
            campaign_key: id.1.clone(),
        };
        sender
            .send(Command { request, reply })
            .map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())?
    }
}

/// Requests for a campaign nobody drives anymore
async fn reject(
    state: CampaignExecutionState,
    request: Request,
    id: CampaignId,
) -> Result<(), ExecutorError> {
    match request {
        Request::Feedback(feedback) => {
            state.process(&feedback).await?;
            Ok(())
        }
        Request::Abort { .. } => Err(ExecutorError::Stopped {
            tenant: id.0,
            campaign_key: id.1,
        }),
    }
}

fn spawn(
    context: Arc<CampaignExecutionContext>,
    state: CampaignExecutionState,
    span: tracing::Span,
) -> mpsc::UnboundedSender<Command> {
    let (sender, receiver) = mpsc::unbounded_channel();
    tokio::spawn(run(context, state, receiver).instrument(span));
    sender
}

async fn run(
    context: Arc<CampaignExecutionContext>,
    mut state: CampaignExecutionState,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let tenant = state.campaign().tenant.clone();
    let campaign_key = state.campaign().key.clone();

    while let Some(Command { request, reply }) = commands.recv().await {
        let start = Instant::now();
        let name = request.name();

        let result = handle(&context, state, request, &tenant, &campaign_key).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let outcome = match result {
            Ok(next) => {
                tracing::info!(elapsed_ms, request = name, phase = next.phase().name(), "handled");
                state = next;
                Ok(())
            }
            Err(e) => {
                tracing::error!(elapsed_ms, request = name, error = %e, "failed");
                // The store holds the last state that was entered
                match resolve(&context, &tenant, &campaign_key).await {
                    Ok(recovered) => state = recovered,
                    Err(recovery) => {
                        tracing::error!(error = %recovery, "campaign cannot be recovered");
                        let _ = reply.send(Err(e));
                        break;
                    }
                }
                Err(e)
            }
        };
        // The requester may have given up waiting
        let _ = reply.send(outcome);

        if state.is_completed() {
            tracing::info!("campaign actor stopped");
            break;
        }
    }
}

async fn handle(
    context: &Arc<CampaignExecutionContext>,
    state: CampaignExecutionState,
    request: Request,
    tenant: &str,
    campaign_key: &str,
) -> Result<CampaignExecutionState, ExecutorError> {
    // Another head may have moved the campaign forward
    let state = if context.store.is_distributed() {
        resolve(context, tenant, campaign_key).await?
    } else {
        state
    };

    let state = match request {
        Request::Feedback(feedback) => match feedback.kind {
            FeedbackKind::CampaignTimeout { hard } => {
                tracing::warn!(hard, "campaign timed out");
                state.abort(AbortConfiguration { hard }).await?
            }
            _ => state.process(&feedback).await?,
        },
        Request::Abort {
            aborter,
            configuration,
        } => {
            if state.is_completed() {
                return Err(ExecutorError::Stopped {
                    tenant: tenant.to_string(),
                    campaign_key: campaign_key.to_string(),
                });
            }
            tracing::info!(aborter = %aborter, hard = configuration.hard, "aborting campaign");
            let mut state = state;
            state.campaign_mut().aborter = Some(aborter.clone());
            context
                .campaign_service
                .abort(tenant, &aborter, campaign_key)
                .await?;
            state.abort(configuration).await?
        }
    };
    settle(context, state).await
}

/// Enter the state if it is new and publish its directives
async fn settle(
    context: &CampaignExecutionContext,
    state: CampaignExecutionState,
) -> Result<CampaignExecutionState, ExecutorError> {
    let mut state = if !state.is_completed() && state.campaign().factories.is_empty() {
        state.disable_without_factories()
    } else {
        state
    };

    let directives = state.init().await?;
    for directive in &directives {
        context.head_channel.publish_directive(directive).await?;
    }
    Ok(state)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
pub(crate) mod tests;
