//! Driver configuration
//!
//! All timings are stored in milliseconds so the struct round-trips through
//! JSON unchanged. Defaults match the pacing the engine has always used
//! against real hosts; `NODEWRIGHT_*` environment variables override them.

use crate::errors::AutomationError;
use crate::locator::{RefreshMode, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 150;
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_SCROLL_SETTLE_MS: u64 = 500;
pub const DEFAULT_CLICK_FALLBACK_DELAY_MS: u64 = 300;
pub const DEFAULT_TAP_DURATION_MS: u64 = 1;
pub const DEFAULT_NODE_TAP_DURATION_MS: u64 = 10;
pub const DEFAULT_DRAG_DURATION_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Wait between two polling attempts
    pub poll_interval_ms: u64,
    /// Wall-clock budget of a polling search
    pub timeout_ms: u64,
    /// What to re-read between polling attempts
    pub refresh_mode: RefreshMode,
    /// Pause after an indexed scroll or a synthetic drag so the UI can settle
    pub scroll_settle_ms: u64,
    /// Pause before the synthetic-tap fallback of a failed click.
    /// Defaults to 300 ms whatever the poll interval.
    pub click_fallback_delay_ms: u64,
    /// Stroke duration of a coordinate tap
    pub tap_duration_ms: u64,
    /// Stroke duration of a tap aimed at a node's center
    pub node_tap_duration_ms: u64,
    /// Stroke duration of scroll drags
    pub drag_duration_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            refresh_mode: RefreshMode::Root,
            scroll_settle_ms: DEFAULT_SCROLL_SETTLE_MS,
            click_fallback_delay_ms: DEFAULT_CLICK_FALLBACK_DELAY_MS,
            tap_duration_ms: DEFAULT_TAP_DURATION_MS,
            node_tap_duration_ms: DEFAULT_NODE_TAP_DURATION_MS,
            drag_duration_ms: DEFAULT_DRAG_DURATION_MS,
        }
    }
}

impl DriverConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AutomationError> {
        let config: DriverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `NODEWRIGHT_*` environment variables.
    pub fn from_env() -> Result<Self, AutomationError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from any key/value source. Keys are the
    /// `NODEWRIGHT_*` environment variable names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AutomationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut u64); 7] = [
            ("NODEWRIGHT_POLL_INTERVAL_MS", &mut self.poll_interval_ms),
            ("NODEWRIGHT_TIMEOUT_MS", &mut self.timeout_ms),
            ("NODEWRIGHT_SCROLL_SETTLE_MS", &mut self.scroll_settle_ms),
            (
                "NODEWRIGHT_CLICK_FALLBACK_DELAY_MS",
                &mut self.click_fallback_delay_ms,
            ),
            ("NODEWRIGHT_TAP_DURATION_MS", &mut self.tap_duration_ms),
            (
                "NODEWRIGHT_NODE_TAP_DURATION_MS",
                &mut self.node_tap_duration_ms,
            ),
            ("NODEWRIGHT_DRAG_DURATION_MS", &mut self.drag_duration_ms),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                *slot = raw.trim().parse::<u64>().map_err(|e| {
                    AutomationError::ConfigError(format!(
                        "{key}={raw:?} is not a millisecond count: {e}"
                    ))
                })?;
                debug!("config override {} = {}", key, slot);
            }
        }

        if let Some(raw) = lookup("NODEWRIGHT_REFRESH_MODE") {
            self.refresh_mode = match raw.trim().to_lowercase().as_str() {
                "root" => RefreshMode::Root,
                "node" => RefreshMode::Node,
                other => {
                    return Err(AutomationError::ConfigError(format!(
                        "NODEWRIGHT_REFRESH_MODE must be 'root' or 'node', got '{other}'"
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AutomationError> {
        if self.poll_interval_ms == 0 {
            return Err(AutomationError::ConfigError(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("tap_duration_ms", self.tap_duration_ms),
            ("node_tap_duration_ms", self.node_tap_duration_ms),
            ("drag_duration_ms", self.drag_duration_ms),
        ] {
            if value == 0 {
                return Err(AutomationError::ConfigError(format!(
                    "{name} must be greater than zero, strokes need a duration"
                )));
            }
        }
        if self.timeout_ms == 0 {
            warn!("timeout_ms is 0, polling searches will make a single attempt");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
            refresh: self.refresh_mode,
        }
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn click_fallback_delay(&self) -> Duration {
        Duration::from_millis(self.click_fallback_delay_ms)
    }

    pub fn tap_duration(&self) -> Duration {
        Duration::from_millis(self.tap_duration_ms)
    }

    pub fn node_tap_duration(&self) -> Duration {
        Duration::from_millis(self.node_tap_duration_ms)
    }

    pub fn drag_duration(&self) -> Duration {
        Duration::from_millis(self.drag_duration_ms)
    }
}
