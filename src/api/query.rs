//! src/api/query.rs
//!
//! Query parameters of the agent `data` endpoint, derived from chart attributes.

use serde_json::{Map, Value};

const WILDCARD: &str = "*";

fn joined(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    let items = attributes.get(key)?.as_array()?;
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("|"))
}

fn text(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    match attributes.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parameters for `GET {host}/api/v2/data`.
///
/// Empty selections become `*`; grouping defaults to per-dimension `avg`.
pub fn data_query(attributes: &Map<String, Value>) -> Vec<(&'static str, String)> {
    let or_wildcard = |key: &str| joined(attributes, key).unwrap_or_else(|| WILDCARD.to_string());

    vec![
        ("format", "json2".to_string()),
        (
            "options",
            joined(attributes, "urlOptions").unwrap_or_else(|| "jsonwrap|flip|nonzero".to_string()),
        ),
        (
            "contexts",
            joined(attributes, "selectedContexts")
                .or_else(|| text(attributes, "context"))
                .unwrap_or_else(|| WILDCARD.to_string()),
        ),
        ("scope_contexts", or_wildcard("contextScope")),
        ("scope_nodes", or_wildcard("nodesScope")),
        ("nodes", or_wildcard("selectedNodes")),
        ("instances", or_wildcard("selectedInstances")),
        ("dimensions", or_wildcard("selectedDimensions")),
        ("labels", or_wildcard("selectedLabels")),
        (
            "group_by[0]",
            joined(attributes, "groupBy").unwrap_or_else(|| "dimension".to_string()),
        ),
        (
            "group_by_label[0]",
            joined(attributes, "groupByLabel").unwrap_or_default(),
        ),
        (
            "aggregation[0]",
            text(attributes, "aggregationMethod").unwrap_or_else(|| "avg".to_string()),
        ),
        (
            "time_group",
            text(attributes, "groupingMethod").unwrap_or_else(|| "average".to_string()),
        ),
        ("after", text(attributes, "after").unwrap_or_else(|| "-600".to_string())),
        ("before", text(attributes, "before").unwrap_or_else(|| "0".to_string())),
        ("points", text(attributes, "points").unwrap_or_else(|| "300".to_string())),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn empty_selections_become_wildcards() {
        let attributes = json!({ "context": "system.cpu", "after": -300 })
            .as_object()
            .cloned()
            .unwrap();
        let params = data_query(&attributes);

        assert_eq!(param(&params, "contexts"), "system.cpu");
        assert_eq!(param(&params, "nodes"), "*");
        assert_eq!(param(&params, "dimensions"), "*");
        assert_eq!(param(&params, "group_by[0]"), "dimension");
        assert_eq!(param(&params, "aggregation[0]"), "avg");
        assert_eq!(param(&params, "after"), "-300");
    }

    #[test]
    fn selections_are_pipe_joined() {
        let attributes = json!({
            "selectedDimensions": ["user", "system"],
            "groupBy": ["node", "label"],
            "groupByLabel": ["mount"],
            "aggregationMethod": "sum",
            "selectedContexts": []
        })
        .as_object()
        .cloned()
        .unwrap();
        let params = data_query(&attributes);

        assert_eq!(param(&params, "dimensions"), "user|system");
        assert_eq!(param(&params, "group_by[0]"), "node|label");
        assert_eq!(param(&params, "group_by_label[0]"), "mount");
        assert_eq!(param(&params, "aggregation[0]"), "sum");
        assert_eq!(param(&params, "contexts"), "*");
    }
}
