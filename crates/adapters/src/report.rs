// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Campaign reports built and published inside the head

use async_trait::async_trait;
use chrono::Utc;
use cm_core::{
    Campaign, CampaignReport, CampaignReportStateKeeper, ExecutionStatus, ReportPublisher,
    ScenarioName, ScenarioReport, ServiceError,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
struct ReportState {
    status: ExecutionStatus,
    scenarios: Vec<ScenarioReport>,
}

/// Keeps the scenario statuses of the campaigns driven by this head.
///
/// Reports only cover what this process saw: a campaign resumed from a
/// shared store has no report here.
#[derive(Debug, Default)]
pub struct InMemoryReportStateKeeper {
    campaigns: Mutex<HashMap<String, ReportState>>,
}

impl InMemoryReportStateKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, campaign_key: &str, f: impl FnOnce(&mut ReportState)) {
        let mut campaigns = self.campaigns.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = campaigns.get_mut(campaign_key) {
            f(state);
        }
    }

    /// Close the campaign and the scenarios that are still running
    fn finish(&self, campaign_key: &str, status: ExecutionStatus) {
        self.update(campaign_key, |state| {
            state.status = status;
            for scenario in &mut state.scenarios {
                if scenario.status == ExecutionStatus::InProgress {
                    scenario.status = status;
                }
            }
        });
    }
}

#[async_trait]
impl CampaignReportStateKeeper for InMemoryReportStateKeeper {
    async fn start(
        &self,
        campaign_key: &str,
        scenarios: &[ScenarioName],
    ) -> Result<(), ServiceError> {
        let state = ReportState {
            status: ExecutionStatus::InProgress,
            scenarios: scenarios
                .iter()
                .map(|scenario_name| ScenarioReport {
                    scenario_name: scenario_name.clone(),
                    status: ExecutionStatus::InProgress,
                    end: None,
                })
                .collect(),
        };
        self.campaigns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(campaign_key.to_string(), state);
        Ok(())
    }

    async fn complete_scenario(
        &self,
        campaign_key: &str,
        scenario: &str,
    ) -> Result<(), ServiceError> {
        self.update(campaign_key, |state| {
            if let Some(report) = state
                .scenarios
                .iter_mut()
                .find(|report| report.scenario_name == scenario)
            {
                report.status = ExecutionStatus::Successful;
                report.end = Some(Utc::now());
            }
        });
        Ok(())
    }

    async fn complete(&self, campaign_key: &str) -> Result<(), ServiceError> {
        self.finish(campaign_key, ExecutionStatus::Successful);
        Ok(())
    }

    async fn abort(&self, campaign_key: &str) -> Result<(), ServiceError> {
        self.finish(campaign_key, ExecutionStatus::Aborted);
        Ok(())
    }

    async fn generate_report(
        &self,
        campaign_key: &str,
    ) -> Result<Option<CampaignReport>, ServiceError> {
        let campaigns = self.campaigns.lock().unwrap_or_else(|e| e.into_inner());
        Ok(campaigns.get(campaign_key).map(|state| CampaignReport {
            campaign_key: campaign_key.to_string(),
            status: state.status,
            message: None,
            scenarios: state.scenarios.clone(),
        }))
    }
}

/// Writes final reports to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingReportPublisher;

impl LoggingReportPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportPublisher for LoggingReportPublisher {
    async fn publish(
        &self,
        campaign: &Campaign,
        report: &CampaignReport,
    ) -> Result<(), ServiceError> {
        let report = serde_json::to_string(report)
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        tracing::info!(tenant = %campaign.tenant, campaign = %campaign.key, %report, "campaign report");
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
