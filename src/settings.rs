//! src/settings.rs
//!
//! Settings of the terminal dashboard: an optional config file named by
//! `DASHBOARD__CONFIG`, overridden by `DASHBOARD__*` environment variables.

use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use dashboard_sdk::SdkConfig;
use serde::Deserialize;

const PREFIX: &str = "DASHBOARD";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Target duration of one ui frame.
    pub frame_ms: u64,
    /// Tracing output; the terminal itself belongs to the ui.
    pub log_file: String,
    /// Probability in `[0, 1]` that a simulated request fails.
    pub failure_rate: f64,
    /// Simulated request latency.
    pub latency_ms: u64,
    pub sdk: SdkConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_ms: 100,
            log_file: "dashboard.log".to_string(),
            failure_rate: 0.05,
            latency_ms: 150,
            sdk: SdkConfig::default(),
        }
    }
}

impl Settings {
    pub fn load() -> color_eyre::Result<Self> {
        let mut builder = Config::builder();
        if let Ok(path) = std::env::var(format!("{PREFIX}__CONFIG")) {
            builder = builder.add_source(File::with_name(&path));
        }
        // `__` keeps keys with underscores (`frame_ms`) addressable.
        builder = builder.add_source(
            Environment::with_prefix(PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> color_eyre::Result<Self> {
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> color_eyre::Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            color_eyre::eyre::bail!("failure_rate must be within [0, 1], got {}", self.failure_rate);
        }
        if self.frame_ms == 0 {
            color_eyre::eyre::bail!("frame_ms must be positive");
        }
        Ok(())
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}
