use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_GROUP: i64 = 1;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawNode {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_group", deserialize_with = "deserialize_group")]
    pub group: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawLink {
    #[serde(deserialize_with = "deserialize_id")]
    pub source: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub target: String,
    #[serde(default, rename = "type")]
    pub relation: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

impl RawGraph {
    /// Every relation type in the payload, sorted and deduplicated.
    pub fn relation_types(&self) -> BTreeSet<&str> {
        self.links.iter().map(|link| link.relation.as_str()).collect()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BubbleRecord {
    pub entity: String,
    #[serde(deserialize_with = "deserialize_number")]
    pub frequency: f64,
}

fn default_group() -> i64 {
    DEFAULT_GROUP
}

/// Reads a number however the backend chose to encode it: a JSON number, a
/// numeric string, a `{low, high}` 64-bit split, or a single-field wrapper.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .trim()
            .parse()
            .ok()
            .filter(|number: &f64| number.is_finite()),
        Value::Object(object) => {
            if let Some(low) = object.get("low").and_then(Value::as_f64) {
                let low = if low < 0.0 { low + 4_294_967_296.0 } else { low };
                let high = object.get("high").and_then(Value::as_f64).unwrap_or(0.0);
                return Some(high * 4_294_967_296.0 + low);
            }
            object.values().find_map(number_from_value)
        }
        _ => None,
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| D::Error::custom(format!("invalid id: {value}")))
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value))
}

fn deserialize_group<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(DEFAULT_GROUP);
    }
    let group = number_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("invalid group: {value}")))?;
    if group.fract() != 0.0 {
        warn!(%value, "non-integer group, using the default");
        return Ok(DEFAULT_GROUP);
    }
    Ok(group as i64)
}

fn deserialize_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value).ok_or_else(|| D::Error::custom(format!("not a number: {value}")))
}

pub fn parse_graph(raw: &str) -> Result<RawGraph> {
    serde_json::from_str(raw).context("invalid graph JSON")
}

pub fn parse_bubbles(raw: &str) -> Result<Vec<BubbleRecord>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid bubble chart JSON")?;
    let entries = parsed
        .as_array()
        .ok_or_else(|| anyhow!("bubble chart payload is not an array"))?;

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match BubbleRecord::deserialize(entry) {
            Ok(record) => records.push(record),
            Err(error) => warn!(%error, "skipping malformed bubble record"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_graph_with_numeric_ids() {
        let graph = parse_graph(
            r#"{"nodes":[{"id":1,"label":"A","group":0},{"id":"2","label":"B"}],
                "links":[{"source":1,"target":"2","type":"near","id":9}]}"#,
        )
        .unwrap();

        assert_eq!(graph.nodes[0].id, "1");
        assert_eq!(graph.nodes[0].group, 0);
        assert_eq!(graph.nodes[1].group, DEFAULT_GROUP);
        assert_eq!(graph.links[0].source, "1");
        assert_eq!(graph.links[0].relation, "near");
        assert_eq!(graph.links[0].id.as_deref(), Some("9"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let graph = parse_graph("{}").unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_graph("<html>").is_err());
    }

    #[test]
    fn frequency_accepts_every_encoding() {
        assert_eq!(number_from_value(&json!(3)), Some(3.0));
        assert_eq!(number_from_value(&json!("4.5")), Some(4.5));
        assert_eq!(number_from_value(&json!({"low": 7, "high": 0})), Some(7.0));
        assert_eq!(number_from_value(&json!({"value": 2})), Some(2.0));
        assert_eq!(number_from_value(&json!(null)), None);
    }

    #[test]
    fn non_finite_strings_are_not_numbers() {
        assert_eq!(number_from_value(&json!("NaN")), None);
        assert_eq!(number_from_value(&json!("inf")), None);
        assert_eq!(number_from_value(&json!({"value": "-infinity"})), None);

        let records = parse_bubbles(r#"[{"entity":"Kim","frequency":"NaN"}]"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn fractional_group_is_not_media() {
        let graph = parse_graph(
            r#"{"nodes":[{"id":"a","group":0.5},{"id":"b","group":"2"}],"links":[]}"#,
        )
        .unwrap();

        assert_eq!(graph.nodes[0].group, DEFAULT_GROUP);
        assert_eq!(graph.nodes[1].group, 2);
    }

    #[test]
    fn relation_types_are_sorted_and_unique() {
        let graph = parse_graph(
            r#"{"nodes":[{"id":"a"},{"id":"b"}],
                "links":[{"source":"a","target":"b","type":"near"},
                         {"source":"b","target":"a","type":"far"},
                         {"source":"a","target":"b","type":"near"}]}"#,
        )
        .unwrap();

        assert_eq!(graph.relation_types().into_iter().collect::<Vec<_>>(), ["far", "near"]);
    }

    #[test]
    fn bubble_parsing_skips_bad_rows() {
        let records = parse_bubbles(
            r#"[{"entity":"Kim","frequency":{"low":12,"high":0}},
                {"entity":"Lee"},
                {"entity":"Park","frequency":"3"}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].frequency, 12.0);
        assert_eq!(records[1].entity, "Park");
    }

    #[test]
    fn bubble_payload_must_be_an_array() {
        assert!(parse_bubbles(r#"{"entity":"Kim"}"#).is_err());
    }
}
