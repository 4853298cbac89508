//! src/pristine.rs
//!
//! Baseline snapshots of filter attributes, used to detect user edits and to
//! reset them atomically.

use serde_json::{Map, Value};

use crate::node::AttributeChange;

/// A reserved attribute key plus the filter keys it snapshots.
///
/// The reserved key holds `{ key -> value before the user touched it }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pristine {
    key: &'static str,
    tracked: &'static [&'static str],
}

pub const PRISTINE: Pristine = Pristine {
    key: "pristine",
    tracked: &[
        "aggregationMethod",
        "selectedDimensions",
        "groupBy",
        "groupByLabel",
        "groupingMethod",
        "chartType",
        "selectedLabels",
        "selectedHosts",
        "selectedInstances",
    ],
};

pub const PRISTINE_COMPOSITE: Pristine = Pristine {
    key: "pristineComposite",
    tracked: &[
        "aggregationMethod",
        "groupingMethod",
        "groupBy",
        "groupByLabel",
        "dimensions",
        "selectedDimensions",
        "selectedInstances",
        "selectedLabels",
        "selectedHosts",
    ],
};

/// Result of [`Pristine::reset`]: the snapshot as it was, and the per-key
/// changes the reset applied (listeners must be fired for these by hand).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PristineReset {
    pub previous: Map<String, Value>,
    pub changes: Vec<AttributeChange>,
}

impl Pristine {
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn tracks(&self, key: &str) -> bool {
        self.tracked.contains(&key)
    }

    pub fn snapshot<'a>(&self, attributes: &'a Map<String, Value>) -> Option<&'a Map<String, Value>> {
        attributes.get(self.key).and_then(Value::as_object)
    }

    pub fn is_pristine(&self, attributes: &Map<String, Value>) -> bool {
        self.snapshot(attributes).is_none_or(Map::is_empty)
    }

    /// Mark `key` dirty before `next` replaces `current`.
    ///
    /// The first divergence captures `current`; moving back to the captured
    /// value drops the entry again. Returns whether the snapshot changed.
    pub fn update(
        &self,
        attributes: &mut Map<String, Value>,
        key: &str,
        current: &Value,
        next: &Value,
    ) -> bool {
        if !self.tracks(key) {
            return false;
        }

        let captured = self.snapshot(attributes).and_then(|s| s.get(key)).cloned();
        if let Some(original) = captured {
            if original != *next {
                return false;
            }
            if let Some(Value::Object(snapshot)) = attributes.get_mut(self.key) {
                snapshot.remove(key);
            }
            return true;
        }

        if current == next {
            return false;
        }

        let slot = attributes
            .entry(self.key)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(snapshot) = slot {
            snapshot.insert(key.to_string(), current.clone());
        }
        true
    }

    /// Restore every captured key into `attributes` and empty the snapshot.
    ///
    /// A captured `null` means the key was unset, so it is removed again.
    pub fn reset(&self, attributes: &mut Map<String, Value>) -> PristineReset {
        let previous = match attributes.insert(self.key.to_string(), Value::Object(Map::new())) {
            Some(Value::Object(snapshot)) => snapshot,
            _ => Map::new(),
        };

        let mut changes = Vec::new();
        for key in self.tracked {
            let Some(original) = previous.get(*key) else {
                continue;
            };
            let prev = if original.is_null() {
                attributes.remove(*key)
            } else {
                attributes.insert(key.to_string(), original.clone())
            };
            changes.push(AttributeChange {
                key: key.to_string(),
                next: original.clone(),
                prev: prev.unwrap_or(Value::Null),
            });
        }

        PristineReset { previous, changes }
    }
}
