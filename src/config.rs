//! Application configuration

use crate::monitor::{StatusWatcher, UpdateJobMonitor};
use crate::screening::debounce::DEFAULT_FILTER_DEBOUNCE;
use crate::screening::FilterPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Tunables for the dashboard core.
///
/// Defaults mirror the observed behavior: 1 s polls for the historical
/// job, 5 s for the status badge, 300 ms filter debounce, sticky filters
/// across sector switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the dashboard backend
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
    /// Poll interval for the historical-data job, milliseconds
    pub job_poll_interval_ms: u64,
    /// Poll interval for the generic status badge, milliseconds
    pub status_poll_interval_ms: u64,
    /// Debounce window for filter inputs, milliseconds
    pub filter_debounce_ms: u64,
    /// Whether filters survive a sector switch
    pub filter_policy: FilterPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/".to_string(),
            http_timeout_secs: 30,
            job_poll_interval_ms: UpdateJobMonitor::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            status_poll_interval_ms: StatusWatcher::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            filter_debounce_ms: DEFAULT_FILTER_DEBOUNCE.as_millis() as u64,
            filter_policy: FilterPolicy::Sticky,
        }
    }
}

impl AppConfig {
    /// Parse a JSON config document, e.g. from an embedder's settings store
    pub fn from_json_str(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.job_poll_interval_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }
}
