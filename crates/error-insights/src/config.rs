//! Configuration for the capture pipeline.
//!
//! Loads settings from a TOML file or uses defaults. Every field has its
//! own default, so partial files are fine. Any non-negative value is
//! legal; the fields are independent.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightsConfig {
    /// Master switch; a disabled pipeline drops every capture.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum retained error events.
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Window in which a repeated fingerprint is suppressed.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Capacity of the WARN+ log ring buffer.
    #[serde(default = "default_log_buffer_capacity")]
    pub log_buffer_capacity: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_events() -> usize {
    10
}

fn default_dedup_window_secs() -> u64 {
    5
}

fn default_log_buffer_capacity() -> usize {
    5
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_events: default_max_events(),
            dedup_window_secs: default_dedup_window_secs(),
            log_buffer_capacity: default_log_buffer_capacity(),
        }
    }
}

impl InsightsConfig {
    /// Loads config from `path`. A missing file yields defaults with a
    /// warning; a malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Dedup window as a duration.
    pub fn dedup_window(&self) -> Duration {
        Duration::seconds(self.dedup_window_secs as i64)
    }
}
