//! src/chart/filters.rs
//!
//! Filter controllers: user-facing setters for aggregation, grouping and
//! selections. Each one is a no-op when nothing changes and otherwise asks the
//! chart to refetch. Edits are tracked into the chart's pristine snapshot.

use serde_json::{Map, Value, json};

use super::Chart;
use crate::metadata::Metadata;
use crate::node::{AttributeChange, Event};

/// One entry of a group-by picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupBySelection {
    Dimension,
    Node,
    Instance,
    Label(String),
}

impl GroupBySelection {
    fn key(&self) -> &str {
        match self {
            GroupBySelection::Dimension => "dimension",
            GroupBySelection::Node => "node",
            GroupBySelection::Instance => "instance",
            GroupBySelection::Label(_) => "label",
        }
    }
}

/// One entry of a node picker: a whole node, or one instance on a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeSelection {
    Node(String),
    Instance(String),
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Filter attributes derived from metadata for composite charts.
///
/// Keeps the current choices, fills in `avg` / `["dimension"]` when unset and
/// drops selected dimensions the metadata no longer describes.
pub(crate) fn initial_attributes(chart: &Chart, metadata: &Metadata) -> Map<String, Value> {
    let mut attributes = Map::new();

    let aggregation = chart
        .get_str("aggregationMethod")
        .unwrap_or_else(|| "avg".to_string());
    attributes.insert("aggregationMethod".into(), json!(aggregation));

    let group_by = chart
        .get_attribute("groupBy")
        .filter(|value| value.as_array().is_some_and(|items| !items.is_empty()))
        .unwrap_or_else(|| json!(["dimension"]));
    attributes.insert("groupBy".into(), group_by);

    if let Some(Value::Array(dimensions)) = chart.get_attribute("dimensions") {
        let known: Vec<Value> = dimensions
            .into_iter()
            .filter(|id| {
                id.as_str()
                    .is_some_and(|id| metadata.dimensions.contains_key(id))
            })
            .collect();
        attributes.insert("dimensions".into(), Value::Array(known));
    }

    attributes
}

impl Chart {
    fn update_and_refetch(&self, key: &str, value: Value) {
        if self.get_attribute(key).as_ref() == Some(&value) {
            return;
        }
        self.update_attribute(key, value);
        self.trigger(Event::Fetch);
    }

    pub fn update_aggregation_method(&self, method: &str) {
        self.update_and_refetch("aggregationMethod", json!(method));
    }

    /// Time aggregation; `alias` is appended to the method (e.g. `percentile` + `95`).
    pub fn update_grouping_method(&self, method: &str, alias: Option<&str>) {
        let value = match alias {
            Some(alias) => format!("{method}{alias}"),
            None => method.to_string(),
        };
        self.update_and_refetch("groupingMethod", json!(value));
    }

    pub fn update_selected_dimensions(&self, dimensions: &[String]) {
        self.update_and_refetch("selectedDimensions", strings(dimensions));
    }

    pub fn update_selected_instances(&self, instances: &[String]) {
        self.update_and_refetch("selectedInstances", strings(instances));
    }

    pub fn update_selected_labels(&self, labels: &[String]) {
        self.update_and_refetch("selectedLabels", strings(labels));
    }

    /// Split the picker selection into `selectedNodes` and
    /// `selectedInstances`, writing only the lists that changed.
    pub fn update_nodes(&self, selection: &[NodeSelection]) {
        let (mut nodes, mut instances) = (Vec::new(), Vec::new());
        for item in selection {
            match item {
                NodeSelection::Node(id) => nodes.push(id.clone()),
                NodeSelection::Instance(id) => instances.push(id.clone()),
            }
        }

        let mut changed = false;
        for (key, value) in [
            ("selectedNodes", strings(&nodes)),
            ("selectedInstances", strings(&instances)),
        ] {
            if self.get_attribute(key).as_ref() != Some(&value) {
                self.update_attribute(key, value);
                changed = true;
            }
        }
        if changed {
            self.trigger(Event::Fetch);
        }
    }

    /// Scope the chart to another context and re-derive its filters from it.
    pub fn update_context_scope(&self, context: &str) {
        let current = self.get_attribute("contextScope");
        let first = current
            .as_ref()
            .and_then(|scope| scope.get(0))
            .and_then(Value::as_str);
        if first == Some(context) {
            return;
        }

        self.update_attribute("contextScope", json!([context]));
        self.update_attributes(initial_attributes(self, &self.metadata()));
        self.trigger(Event::Fetch);
    }

    /// Split the picker selection into `groupBy` and `groupByLabel`.
    pub fn update_group_by(&self, selection: &[GroupBySelection]) {
        let labels: Vec<String> = selection
            .iter()
            .filter_map(|item| match item {
                GroupBySelection::Label(label) => Some(label.clone()),
                _ => None,
            })
            .collect();

        let mut group_by: Vec<String> = selection
            .iter()
            .filter(|item| !matches!(item, GroupBySelection::Label(_)))
            .map(|item| item.key().to_string())
            .collect();
        if !labels.is_empty() {
            group_by.push("label".to_string());
        }
        if group_by.is_empty() {
            group_by.push("dimension".to_string());
        }

        let group_by = strings(&group_by);
        let labels = strings(&labels);
        if self.get_attribute("groupBy").as_ref() == Some(&group_by)
            && self
                .get_attribute("groupByLabel")
                .unwrap_or_else(|| json!([]))
                == labels
        {
            return;
        }

        let mut patch = Map::new();
        patch.insert("groupBy".into(), group_by);
        patch.insert("groupByLabel".into(), labels);
        self.update_attributes(patch);
        self.update_attributes(initial_attributes(self, &self.metadata()));
        self.trigger(Event::Fetch);
    }

    /// Composite charts: add or remove one dimension id; `all` clears the
    /// selection, as does selecting every dimension or none.
    pub fn toggle_dimension(&self, id: &str) {
        let current: Vec<String> = self
            .get_attribute("dimensions")
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        let next: Vec<String> = if id == "all" {
            Vec::new()
        } else if current.iter().any(|dimension| dimension == id) {
            current.into_iter().filter(|dimension| dimension != id).collect()
        } else {
            current.into_iter().chain(std::iter::once(id.to_string())).collect()
        };
        let next = if next.len() == self.metadata().dimensions.len() {
            Vec::new()
        } else {
            next
        };

        self.update_attribute("dimensions", strings(&next));
        self.trigger(Event::Fetch);
    }

    /// Restore every snapshotted filter, re-fire the affected listeners, and
    /// refetch.
    pub fn reset_pristine(&self) {
        let pristine = self.pristine();
        let Some(reset) = self.with_attributes_mut(|attributes| pristine.reset(attributes)) else {
            return;
        };

        let next = Value::Object(Map::new());
        let prev = Value::Object(reset.previous);
        self.notify_attribute_change(&AttributeChange {
            key: pristine.key().to_string(),
            next: next.clone(),
            prev: prev.clone(),
        });
        if let Some(sdk) = self.sdk() {
            sdk.trigger(Event::PristineChanged {
                node: self.node().clone(),
                key: pristine.key().to_string(),
                next,
                prev,
            });
        }
        for change in &reset.changes {
            self.notify_attribute_change(change);
        }

        self.trigger(Event::Fetch);
    }

    /// Accept the current filters as the new baseline.
    pub fn remove_pristine(&self) {
        let pristine = self.pristine();
        let prev = self.get_own_attribute(pristine.key()).unwrap_or(Value::Null);
        let next = Value::Object(Map::new());

        let mut patch = Map::new();
        patch.insert(pristine.key().to_string(), next.clone());
        self.set_attributes(patch);

        if let Some(sdk) = self.sdk() {
            sdk.trigger(Event::PristineChanged {
                node: self.node().clone(),
                key: pristine.key().to_string(),
                next,
                prev,
            });
        }
    }
}
