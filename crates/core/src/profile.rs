// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution profiles: how minions of a scenario are paced when starting.
//!
//! The head only carries the configuration to the factories; the pacing
//! arithmetic is provided by implementations of [`ExecutionProfile`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializable description of a ramp-up profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionProfileConfiguration {
    /// All the minions start at once
    #[default]
    Immediately,
    /// A fixed number of minions starts at every period
    Regular {
        #[serde(with = "humantime_serde")]
        period: Duration,
        minions_count_per_period: u32,
    },
    /// Successive stages, each ramping up a share of the minions
    Stages { stages: Vec<Stage> },
}

impl ExecutionProfileConfiguration {
    /// Profile the head can evaluate itself; paced profiles are evaluated by
    /// the factories
    pub fn local_profile(&self) -> Option<Box<dyn ExecutionProfile>> {
        match self {
            ExecutionProfileConfiguration::Immediately => Some(Box::new(ImmediateExecutionProfile)),
            ExecutionProfileConfiguration::Regular { .. }
            | ExecutionProfileConfiguration::Stages { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub minions_count: u32,
    #[serde(with = "humantime_serde")]
    pub ramp_up_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub total_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub resolution: Duration,
}

/// A batch of minions to start after an offset from the campaign start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinionsStartingLine {
    pub count: u32,
    pub offset: Duration,
}

/// Pacing strategy producing the starting lines of a scenario
pub trait ExecutionProfile: Send + Sync {
    fn iterator(
        &self,
        total_minions: u32,
        speed_factor: f64,
    ) -> Box<dyn Iterator<Item = MinionsStartingLine> + Send>;
}

/// Starting lines of a profile, summarized as (lines, minions)
pub fn plan(profile: &dyn ExecutionProfile, total_minions: u32, speed_factor: f64) -> (usize, u32) {
    profile
        .iterator(total_minions, speed_factor)
        .fold((0, 0), |(lines, minions), line| {
            (lines + 1, minions.saturating_add(line.count))
        })
}

/// Starts every minion in a single line at offset zero
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateExecutionProfile;

impl ExecutionProfile for ImmediateExecutionProfile {
    fn iterator(
        &self,
        total_minions: u32,
        _speed_factor: f64,
    ) -> Box<dyn Iterator<Item = MinionsStartingLine> + Send> {
        let line = MinionsStartingLine {
            count: total_minions,
            offset: Duration::ZERO,
        };
        Box::new(std::iter::once(line).filter(|line| line.count > 0))
    }
}
