//! Configuration for the Glint core.
//!
//! The host extension hands tunables over as JSON (the same shape its
//! options page persists), so loading is string-based; the core never
//! reads configuration from disk.
//!
//! # Defaults
//!
//! On-device inference is slow and front-loaded with model warm-up
//! cost, so the per-attempt operation timeout is multi-minute and the
//! retry budget is deliberately small.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime tunables for the Glint core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlintConfig {
    /// Bound on each `availability()` probe call, in seconds.
    pub probe_timeout_secs: u64,

    /// Bound on session creation, in seconds (covers model warm-up).
    pub create_timeout_secs: u64,

    /// Bound on each inference attempt, in seconds.
    pub operation_timeout_secs: u64,

    /// Additional attempts after the first failure.
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts, in ms.
    pub backoff_base_ms: u64,

    /// How often the dispatcher sweeps idle contexts, in seconds.
    pub sweep_interval_secs: u64,

    /// Idle window after which a context is considered stale, in seconds.
    pub context_ttl_secs: u64,

    /// Minimum accepted input length, in characters.
    pub min_input_chars: usize,

    /// Inputs longer than this are truncated before prompt construction.
    pub max_input_chars: usize,
}

impl Default for GlintConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
            create_timeout_secs: default_create_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            context_ttl_secs: default_context_ttl_secs(),
            min_input_chars: default_min_input_chars(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_probe_timeout_secs() -> u64 {
    15
}

fn default_create_timeout_secs() -> u64 {
    45
}

fn default_operation_timeout_secs() -> u64 {
    240
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_base_ms() -> u64 {
    1500
}

fn default_sweep_interval_secs() -> u64 {
    1800
}

fn default_context_ttl_secs() -> u64 {
    1800
}

fn default_min_input_chars() -> usize {
    10
}

fn default_max_input_chars() -> usize {
    12_000
}

impl GlintConfig {
    /// Parse a configuration from the JSON shape the host persists.
    ///
    /// Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Serialize back to the JSON shape the host persists.
    pub fn to_json_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn context_ttl(&self) -> Duration {
        Duration::from_secs(self.context_ttl_secs)
    }
}
