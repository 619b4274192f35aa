// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Head configuration read from TOML

use std::path::{Path, PathBuf};
use std::time::Duration;

use cm_core::{LaunchSequence, DEFAULT_ABORT_GRACE_PERIOD};
use serde::Deserialize;

use crate::lifecycle::LifecycleError;

/// Environment variable overriding the configuration path
pub const CONFIG_PATH_VAR: &str = "CM_HEAD_CONFIG";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "cm-head.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadConfig {
    /// Redis server shared by the heads; the head runs alone without it
    pub redis_url: Option<String>,
    /// Broadcast channel of campaigns started without one
    pub broadcast_channel: String,
    /// Channel factories publish their feedbacks on
    pub feedback_channel: String,
    /// Channel carrying start and abort commands in a cluster
    pub command_channel: String,
    #[serde(with = "humantime_serde")]
    pub abort_grace_period: Duration,
    /// How often due delayed feedbacks are claimed in a cluster
    #[serde(with = "humantime_serde")]
    pub delayed_poll_interval: Duration,
    /// Sequence of campaigns whose start command does not name one
    pub launch_sequence: LaunchSequence,
    pub log_path: PathBuf,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            broadcast_channel: "directives-broadcast".to_string(),
            feedback_channel: "feedbacks".to_string(),
            command_channel: "campaign-commands".to_string(),
            abort_grace_period: DEFAULT_ABORT_GRACE_PERIOD,
            delayed_poll_interval: Duration::from_millis(500),
            launch_sequence: LaunchSequence::default(),
            log_path: default_log_path(),
        }
    }
}

impl HeadConfig {
    /// Load from `CM_HEAD_CONFIG`, else `cm-head.toml` in the working directory
    pub fn load() -> Result<Self, LifecycleError> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// Load from `path`; defaults apply when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, LifecycleError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| LifecycleError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_clustered(&self) -> bool {
        self.redis_url.is_some()
    }
}

/// `$XDG_STATE_HOME/cm/head.log`, else `~/.local/state/cm/head.log`
fn default_log_path() -> PathBuf {
    let state_dir = match std::env::var_os("XDG_STATE_HOME") {
        Some(xdg) => PathBuf::from(xdg),
        None => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".local/state"),
            None => PathBuf::from("."),
        },
    };
    state_dir.join("cm").join("head.log")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
