//! src/config.rs
//!
//! Tunables for the fetch lifecycle, the scheduler and the play coordinator.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SdkConfig {
    /// Agent base url used by the http fetcher.
    pub host: String,

    /// Advisory request timeout; reaching it fires `Timeout(true)`.
    pub request_timeout_ms: u64,

    /// Upper bound for the failure backoff.
    pub max_backoff_ms: u64,

    /// Update interval used when neither the chart, the payload nor the
    /// metadata provide one.
    pub default_update_every_secs: u64,

    /// Period of the play coordinator's render loop.
    pub render_interval_ms: u64,

    /// Attributes applied to the root container, inherited by every node.
    pub attributes: Map<String, Value>,
}

impl SdkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:19999".to_string(),
            request_timeout_ms: 5_000,
            max_backoff_ms: 30_000,
            default_update_every_secs: 2,
            render_interval_ms: 1_000,
            attributes: Map::new(),
        }
    }
}
