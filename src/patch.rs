//! Schema patches applied to fused schemas through [`walk`](crate::walk).
//!
//! Fusion of sampled data leaves untyped `{}` leaves wherever a field was
//! never observed with a value, and one-sided properties keep their
//! non-nullable types. These transforms fill the gaps from a documentation
//! schema and make properties nullable so a Singer tap accepts them.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::lookup::lookup;
use crate::types::NULL_TYPE;
use crate::walk::Transform;

/// Empty nodes this close to the root are rejected by the tap check.
pub const MIN_EMPTY_DEPTH: usize = 4;

/// Replace `{}` nodes with the node at the same path in a documentation schema.
///
/// Paths without a counterpart are collected in [`FillEmpty::missing`].
#[derive(Debug)]
pub struct FillEmpty<'a> {
    documentation: &'a Value,
    missing: Vec<String>,
}

impl<'a> FillEmpty<'a> {
    pub fn new(documentation: &'a Value) -> Self {
        Self {
            documentation,
            missing: Vec::new(),
        }
    }

    /// Dot-joined paths of empty nodes that had no replacement.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

impl Transform for FillEmpty<'_> {
    fn apply(&mut self, path: &[String], node: &Value) -> Option<Value> {
        if !is_empty_object(node) {
            return None;
        }
        match lookup(self.documentation, path) {
            Ok(replacement) => {
                info!(path = %path.join("."), "empty node filled from documentation");
                Some(replacement.clone())
            }
            Err(_) => {
                self.missing.push(path.join("."));
                None
            }
        }
    }
}

/// Add `"null"` to the type of every property node.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddNulls;

impl Transform for AddNulls {
    fn apply(&mut self, path: &[String], node: &Value) -> Option<Value> {
        if !is_property(path, node) || declares_null(node) {
            return None;
        }

        let mut map = node.as_object()?.clone();
        let types = match map.get("type")? {
            Value::String(name) => vec![Value::String(name.clone()), Value::from(NULL_TYPE)],
            Value::Array(names) => {
                let mut names = names.clone();
                names.push(Value::from(NULL_TYPE));
                names
            }
            _ => return None,
        };
        map.insert("type".to_string(), Value::Array(types));
        Some(Value::Object(map))
    }
}

/// Remove the given keys from every object node.
#[derive(Debug, Default, Clone)]
pub struct StripKeys {
    keys: BTreeSet<String>,
}

impl StripKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Transform for StripKeys {
    fn apply(&mut self, _path: &[String], node: &Value) -> Option<Value> {
        let map = node.as_object()?;
        if !map.keys().any(|k| self.keys.contains(k)) {
            return None;
        }
        let kept: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| !self.keys.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Value::Object(kept))
    }
}

/// A schema location a Singer tap would reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapIssue {
    /// Dot-joined path of the node.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for TapIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Check a schema against the tap's expectations.
///
/// Every property must be nullable, and `{}` nodes must sit deeper than three
/// levels below the root.
pub fn check_tap_requirements(schema: &Value) -> Vec<TapIssue> {
    let mut issues = Vec::new();
    let mut path = Vec::new();
    check_node(schema, &mut path, &mut issues);
    issues
}

fn check_node(node: &Value, path: &mut Vec<String>, issues: &mut Vec<TapIssue>) {
    if is_property(path, node) {
        if !declares_null(node) {
            issues.push(TapIssue {
                path: path.join("."),
                message: format!("property is not nullable: {}", node["type"]),
            });
        }
    } else if is_empty_object(node) && path.len() < MIN_EMPTY_DEPTH {
        issues.push(TapIssue {
            path: path.join("."),
            message: "empty schema too close to root".to_string(),
        });
    }

    match node {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                check_node(child, path, issues);
                path.pop();
            }
        }
        Value::Array(arr) => {
            for (i, child) in arr.iter().enumerate() {
                path.push(i.to_string());
                check_node(child, path, issues);
                path.pop();
            }
        }
        _ => {}
    }
}

/// A typed object directly inside a `properties` mapping.
fn is_property(path: &[String], node: &Value) -> bool {
    let under_properties = path.len() >= 2 && path[path.len() - 2] == "properties";
    under_properties && node.get("type").is_some()
}

fn declares_null(node: &Value) -> bool {
    match node.get("type") {
        Some(Value::String(name)) => name == NULL_TYPE,
        Some(Value::Array(names)) => names.iter().any(|n| n == NULL_TYPE),
        _ => false,
    }
}

fn is_empty_object(node: &Value) -> bool {
    node.as_object().is_some_and(Map::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::walk;
    use serde_json::json;

    #[test]
    fn fill_empty_uses_documentation() {
        let schema = json!({
            "type": "object",
            "properties": {
                "owner": {},
                "extra": {}
            }
        });
        let documentation = json!({
            "properties": {
                "owner": { "type": "object", "properties": { "id": { "type": "string" } } }
            }
        });

        let mut fill = FillEmpty::new(&documentation);
        let result = walk(&schema, &mut [&mut fill]);

        assert_eq!(
            result["properties"]["owner"]["properties"]["id"]["type"],
            "string"
        );
        assert_eq!(result["properties"]["extra"], json!({}));
        assert_eq!(fill.missing(), ["properties.extra"]);
    }

    #[test]
    fn add_nulls_to_properties_only() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "tags": { "type": ["array"], "items": { "type": "string" } },
                "note": { "type": ["string", "null"] }
            }
        });

        let result = walk(&schema, &mut [&mut AddNulls]);

        assert_eq!(result["type"], "object");
        assert_eq!(result["properties"]["id"]["type"], json!(["integer", "null"]));
        assert_eq!(result["properties"]["tags"]["type"], json!(["array", "null"]));
        assert_eq!(result["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(result["properties"]["note"]["type"], json!(["string", "null"]));
    }

    #[test]
    fn property_named_properties_is_handled() {
        let schema = json!({
            "properties": { "properties": { "type": "object", "properties": {} } }
        });
        let result = walk(&schema, &mut [&mut AddNulls]);
        assert_eq!(
            result["properties"]["properties"]["type"],
            json!(["object", "null"])
        );
    }

    #[test]
    fn strip_keys_everywhere() {
        let schema = json!({
            "type": "object",
            "description": "root",
            "properties": {
                "id": { "type": "string", "description": "id", "example": "abc" }
            }
        });
        let mut strip = StripKeys::new(["description", "example"]);
        let result = walk(&schema, &mut [&mut strip]);
        assert_eq!(
            result,
            json!({ "type": "object", "properties": { "id": { "type": "string" } } })
        );
    }

    #[test]
    fn tap_check_flags_non_nullable_and_shallow_empty() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "raw": {},
                "nested": {
                    "type": ["object", "null"],
                    "properties": { "deep": {} }
                }
            }
        });

        let issues = check_tap_requirements(&schema);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["properties.id", "properties.raw"]);
    }

    #[test]
    fn tap_check_passes_patched_schema() {
        let schema = json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } }
        });
        let patched = walk(&schema, &mut [&mut AddNulls]);
        assert!(check_tap_requirements(&patched).is_empty());
    }
}
