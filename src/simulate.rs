//! src/simulate.rs
//!
//! In-process stand-in for an agent: random-walk series answered in the raw
//! snake_case payload shape, with configurable latency and failure rate.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use dashboard_sdk::metadata::DimensionInfo;
use dashboard_sdk::{Chart, Clock, DataFetcher, FetchError, Metadata, MetadataStore};
use futures::future::LocalBoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Oldest point the simulated agent claims to keep.
const RETENTION_SECS: i64 = 3_600;
const MAX_POINTS: i64 = 600;

/// A simulated context: units, dimension ids and the walk's centre and spread.
pub struct Context {
    pub id: &'static str,
    pub title: &'static str,
    pub units: &'static str,
    pub dimensions: &'static [&'static str],
    pub level: f64,
    pub step: f64,
}

pub const CONTEXTS: &[Context] = &[
    Context {
        id: "system.cpu",
        title: "Total CPU utilization",
        units: "percentage",
        dimensions: &["user", "system", "iowait"],
        level: 20.0,
        step: 4.0,
    },
    Context {
        id: "system.net",
        title: "Physical network interfaces aggregated traffic",
        units: "kilobits/s",
        dimensions: &["received", "sent"],
        level: 4_000.0,
        step: 900.0,
    },
    Context {
        id: "system.ram",
        title: "System RAM",
        units: "MiB",
        dimensions: &["used", "cached", "buffers", "free"],
        level: 2_048.0,
        step: 64.0,
    },
];

pub struct SimulatedAgent {
    clock: Clock,
    latency: Duration,
    failure_rate: f64,
    rng: RefCell<StdRng>,
    /// Last value per `context/dimension`.
    levels: RefCell<HashMap<String, f64>>,
}

impl SimulatedAgent {
    pub fn new(clock: Clock, latency: Duration, failure_rate: f64) -> Self {
        Self::with_rng(clock, latency, failure_rate, StdRng::from_os_rng())
    }

    pub fn with_rng(clock: Clock, latency: Duration, failure_rate: f64, rng: StdRng) -> Self {
        Self {
            clock,
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: RefCell::new(rng),
            levels: RefCell::new(HashMap::new()),
        }
    }

    /// Register every simulated context with `store`.
    pub fn describe(&self, store: &MetadataStore) {
        let first_entry = self.clock.now_ms() / 1000 - RETENTION_SECS;
        for context in CONTEXTS {
            let dimensions: BTreeMap<String, DimensionInfo> = context
                .dimensions
                .iter()
                .map(|id| {
                    (
                        id.to_string(),
                        DimensionInfo {
                            name: id.to_string(),
                        },
                    )
                })
                .collect();
            store.insert(
                context.id,
                Metadata {
                    id: context.id.to_string(),
                    title: context.title.to_string(),
                    update_every: Some(1),
                    units: context.units.to_string(),
                    first_entry: Some(first_entry),
                    dimensions,
                },
            );
        }
    }

    /// Absolute `(after, before)` seconds of the chart's requested window.
    fn window(&self, chart: &Chart) -> (i64, i64) {
        let (after, before) = chart.window();
        if after < 0 {
            let now = self.clock.now_ms() / 1000;
            let before = now + before.min(0);
            (before + after, before)
        } else {
            (after, before.max(after + 1))
        }
    }

    fn selected_dimensions(chart: &Chart, context: &Context) -> Vec<String> {
        let pick = |key: &str| -> Vec<String> {
            chart
                .get_attribute(key)
                .and_then(|value| serde_json::from_value::<Vec<String>>(value).ok())
                .unwrap_or_default()
                .into_iter()
                .filter(|id| context.dimensions.contains(&id.as_str()))
                .collect()
        };
        let selected = pick("selectedDimensions");
        let selected = if selected.is_empty() {
            pick("dimensions")
        } else {
            selected
        };
        if selected.is_empty() {
            context.dimensions.iter().map(|id| id.to_string()).collect()
        } else {
            selected
        }
    }

    fn walk(&self, key: String, context: &Context) -> f64 {
        let mut rng = self.rng.borrow_mut();
        let mut levels = self.levels.borrow_mut();
        let level = levels.entry(key).or_insert(context.level);
        let delta: f64 = rng.random_range(-context.step..context.step);
        *level = (*level + delta).max(0.0);
        *level
    }

    /// Raw payload for `chart`'s current attributes.
    fn answer(&self, chart: &Chart) -> Result<Value, FetchError> {
        let context_id = chart
            .get_str("context")
            .ok_or(FetchError::Status(400))?;
        let context = CONTEXTS
            .iter()
            .find(|context| context.id == context_id)
            .ok_or(FetchError::Status(404))?;

        let (after, before) = self.window(chart);
        let points = chart.get_i64("points").unwrap_or(60).clamp(1, MAX_POINTS);
        let every = ((before - after) / points).max(1);

        let dimensions = Self::selected_dimensions(chart, context);
        let summed = chart.get_str("aggregationMethod").as_deref() == Some("sum");
        let dimension_ids: Vec<String> = if summed {
            vec!["sum".to_string()]
        } else {
            dimensions.clone()
        };

        let mut data = Vec::new();
        let mut timestamp = after + every;
        while timestamp <= before {
            let values: Vec<f64> = dimensions
                .iter()
                .map(|id| self.walk(format!("{}/{id}", context.id), context))
                .collect();
            let mut row = vec![json!(timestamp)];
            if summed {
                row.push(json!(values.iter().sum::<f64>()));
            } else {
                row.extend(values.into_iter().map(|v| json!(v)));
            }
            data.push(Value::Array(row));
            timestamp += every;
        }

        let labels: Vec<&str> = std::iter::once("time")
            .chain(dimension_ids.iter().map(String::as_str))
            .collect();
        Ok(json!({
            "dimension_ids": dimension_ids,
            "view_update_every": every,
            "after": after,
            "before": before,
            "first_entry": self.clock.now_ms() / 1000 - RETENTION_SECS,
            "last_entry": before,
            "result": { "labels": labels, "data": data },
        }))
    }
}

impl DataFetcher for SimulatedAgent {
    fn fetch(&self, chart: &Chart, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
        let failed = self.rng.borrow_mut().random_bool(self.failure_rate);
        let answer = if failed {
            Err(FetchError::Status(503))
        } else {
            self.answer(chart)
        };
        debug!(chart = %chart.id(), ok = answer.is_ok(), "simulated request");

        let latency = self.latency;
        Box::pin(async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Aborted),
                _ = tokio::time::sleep(latency) => answer,
            }
        })
    }
}
