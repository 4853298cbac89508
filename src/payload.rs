//! src/payload.rs
//!
//! Fetched time-series payloads: decoding of the agent's raw snake_case JSON,
//! timestamp normalization, and the sticky merge with the previous payload.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FetchError;

/// One `[timestamp, value...]` row; `timestamp` in epoch milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub timestamp: i64,
    pub values: Vec<Option<f64>>,
}

impl Row {
    pub fn new(timestamp: i64, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            timestamp,
            values: values.into_iter().map(Some).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub labels: Vec<String>,
    /// Ascending by timestamp.
    pub data: Vec<Row>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    pub dimension_ids: Vec<String>,
    pub result: ResultSet,
    /// Epoch milliseconds.
    pub first_entry: Option<i64>,
    /// Epoch milliseconds.
    pub last_entry: Option<i64>,
    /// Seconds between points of the returned view.
    pub view_update_every: Option<u64>,
    /// Window actually served, in epoch seconds.
    pub after: Option<i64>,
    pub before: Option<i64>,
    /// Every other top-level key, camel-cased.
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default, alias = "dimensionIds")]
    dimension_ids: Vec<String>,
    #[serde(default)]
    result: Option<RawResult>,
    #[serde(default, alias = "firstEntry")]
    first_entry: Option<f64>,
    #[serde(default, alias = "lastEntry")]
    last_entry: Option<f64>,
    #[serde(default, alias = "viewUpdateEvery")]
    view_update_every: Option<u64>,
    #[serde(default)]
    after: Option<i64>,
    #[serde(default)]
    before: Option<i64>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResult {
    Table {
        #[serde(default)]
        labels: Vec<String>,
        #[serde(default)]
        data: Vec<Vec<Option<f64>>>,
    },
    Series(Vec<Option<f64>>),
}

fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// `view_update_every` -> `viewUpdateEvery`.
pub fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl Payload {
    /// Decode a raw agent response, converting second timestamps to ms.
    pub fn from_raw(raw: Value) -> Result<Payload, FetchError> {
        let raw: RawPayload = serde_json::from_value(raw)?;

        let result = match raw.result {
            None => ResultSet::default(),
            Some(RawResult::Table { labels, data }) => ResultSet {
                labels,
                data: data
                    .into_iter()
                    .filter_map(|mut row| {
                        if row.is_empty() {
                            return None;
                        }
                        let timestamp = secs_to_ms(row.remove(0)?);
                        Some(Row {
                            timestamp,
                            values: row,
                        })
                    })
                    .collect(),
            },
            // A bare series: one point per view interval, starting after `after`.
            Some(RawResult::Series(points)) => {
                let after = raw.after.unwrap_or_default();
                let every = raw.view_update_every.unwrap_or(1) as i64;
                ResultSet {
                    labels: vec!["time".to_string(), "sum".to_string()],
                    data: points
                        .into_iter()
                        .enumerate()
                        .map(|(index, point)| Row {
                            timestamp: (after + every * (index as i64 + 1)) * 1000,
                            values: vec![point],
                        })
                        .collect(),
                }
            }
        };

        Ok(Payload {
            dimension_ids: raw.dimension_ids,
            result,
            first_entry: raw.first_entry.map(secs_to_ms),
            last_entry: raw.last_entry.map(secs_to_ms),
            view_update_every: raw.view_update_every,
            after: raw.after,
            before: raw.before,
            extra: raw
                .rest
                .into_iter()
                .map(|(key, value)| (camelize(&key), value))
                .collect(),
        })
    }

    /// Merge `next` over `self`.
    ///
    /// Same dimension set: fields missing from `next` keep their previous
    /// value. Different dimension set: `next` replaces everything.
    pub fn merge(&self, next: Payload) -> Payload {
        if self.dimension_ids != next.dimension_ids {
            return next;
        }

        let mut extra = self.extra.clone();
        extra.extend(next.extra);
        Payload {
            dimension_ids: next.dimension_ids,
            result: next.result,
            first_entry: next.first_entry.or(self.first_entry),
            last_entry: next.last_entry.or(self.last_entry),
            view_update_every: next.view_update_every.or(self.view_update_every),
            after: next.after.or(self.after),
            before: next.before.or(self.before),
            extra,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.result.data
    }

    /// (min, max) over every value of every row; `None` when there are none.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.rows()
            .iter()
            .flat_map(|row| row.values.iter().flatten().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_snake_case_and_converts_seconds() {
        let payload = Payload::from_raw(json!({
            "dimension_ids": ["in", "out"],
            "first_entry": 1_600_000_000,
            "view_update_every": 2,
            "node_count": 3,
            "result": {
                "labels": ["time", "in", "out"],
                "data": [[1_700_000_000, 1.5, null], [1_700_000_002, 2.0, 3.0]]
            }
        }))
        .unwrap();

        assert_eq!(payload.first_entry, Some(1_600_000_000_000));
        assert_eq!(payload.view_update_every, Some(2));
        assert_eq!(payload.extra.get("nodeCount"), Some(&json!(3)));
        assert_eq!(
            payload.rows()[0],
            Row {
                timestamp: 1_700_000_000_000,
                values: vec![Some(1.5), None]
            }
        );
        assert_eq!(payload.bounds(), Some((1.5, 3.0)));
    }

    #[test]
    fn bare_series_becomes_sum_rows() {
        let payload = Payload::from_raw(json!({
            "after": 100,
            "view_update_every": 5,
            "result": [1.0, 2.0]
        }))
        .unwrap();

        assert_eq!(payload.result.labels, vec!["time", "sum"]);
        assert_eq!(payload.rows()[0].timestamp, 105_000);
        assert_eq!(payload.rows()[1].timestamp, 110_000);
    }

    #[test]
    fn same_dimensions_merge_sticky() {
        let prev = Payload::from_raw(json!({
            "dimension_ids": ["a"],
            "first_entry": 10,
            "summary": { "nodes": 1 },
            "result": { "labels": ["time", "a"], "data": [[1, 1.0]] }
        }))
        .unwrap();
        let next = Payload::from_raw(json!({
            "dimension_ids": ["a"],
            "result": { "labels": ["time", "a"], "data": [[2, 2.0]] }
        }))
        .unwrap();

        let merged = prev.merge(next);
        assert_eq!(merged.first_entry, Some(10_000));
        assert_eq!(merged.extra.get("summary"), Some(&json!({ "nodes": 1 })));
        assert_eq!(merged.rows()[0].timestamp, 2_000);
    }

    #[test]
    fn different_dimensions_replace_everything() {
        let prev = Payload::from_raw(json!({
            "dimension_ids": ["a"],
            "first_entry": 10,
            "summary": {}
        }))
        .unwrap();
        let next = Payload::from_raw(json!({ "dimension_ids": ["a", "b"] })).unwrap();

        let merged = prev.merge(next.clone());
        assert_eq!(merged, next);
        assert_eq!(merged.first_entry, None);
    }

    #[test]
    fn camelizes_keys() {
        assert_eq!(camelize("view_update_every"), "viewUpdateEvery");
        assert_eq!(camelize("after"), "after");
        assert_eq!(camelize("_private"), "private");
    }
}
