//! Generic tree walker applying node transformations to a JSON document.
//!
//! Used to patch fused schemas after the fact, e.g. with [`crate::AddNulls`].

use serde_json::{Map, Value};
use tracing::debug;

/// A node transformation.
///
/// Receives the path of the node (object keys and array indices) and the node
/// itself. Returning `Some` replaces the node.
pub trait Transform {
    fn apply(&mut self, path: &[String], node: &Value) -> Option<Value>;
}

impl<F> Transform for F
where
    F: FnMut(&[String], &Value) -> Option<Value>,
{
    fn apply(&mut self, path: &[String], node: &Value) -> Option<Value> {
        self(path, node)
    }
}

/// Walk `document` pre-order and return the transformed copy.
///
/// At every node the transforms run in order, each seeing the output of the
/// previous one. The children of the resulting node are visited afterwards,
/// so replacements are walked too.
///
/// # Example
///
/// ```
/// use schema_fusion::walk;
/// use serde_json::{json, Value};
///
/// let doc = json!({ "a": 1, "b": { "c": 2 } });
/// let mut double = |_: &[String], node: &Value| node.as_i64().map(|n| json!(n * 2));
///
/// assert_eq!(walk(&doc, &mut [&mut double]), json!({ "a": 2, "b": { "c": 4 } }));
/// ```
pub fn walk(document: &Value, transforms: &mut [&mut dyn Transform]) -> Value {
    let mut path = Vec::new();
    walk_node(document, &mut path, transforms)
}

fn walk_node(node: &Value, path: &mut Vec<String>, transforms: &mut [&mut dyn Transform]) -> Value {
    let mut current: Option<Value> = None;
    for transform in transforms.iter_mut() {
        let input = current.as_ref().unwrap_or(node);
        if let Some(replacement) = transform.apply(path, input) {
            debug!(path = %path.join("."), "node replaced");
            current = Some(replacement);
        }
    }

    match current.as_ref().unwrap_or(node) {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, child) in map {
                path.push(key.clone());
                result.insert(key.clone(), walk_node(child, path, transforms));
                path.pop();
            }
            Value::Object(result)
        }
        Value::Array(arr) => {
            let mut result = Vec::with_capacity(arr.len());
            for (i, child) in arr.iter().enumerate() {
                path.push(i.to_string());
                result.push(walk_node(child, path, transforms));
                path.pop();
            }
            Value::Array(result)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_transforms_is_identity() {
        let doc = json!({ "a": [1, { "b": null }], "c": "x" });
        assert_eq!(walk(&doc, &mut []), doc);
    }

    #[test]
    fn paths_include_keys_and_indices() {
        let doc = json!({ "a": [{ "b": 1 }] });
        let mut seen = Vec::new();
        let mut record = |path: &[String], _: &Value| {
            seen.push(path.join("."));
            None
        };
        walk(&doc, &mut [&mut record]);
        assert_eq!(seen, vec!["", "a", "a.0", "a.0.b"]);
    }

    #[test]
    fn later_transforms_see_replacement() {
        let doc = json!({ "x": {} });
        let mut fill = |_: &[String], node: &Value| {
            (node == &json!({})).then(|| json!({ "type": "string" }))
        };
        let mut tag = |_: &[String], node: &Value| {
            (node.get("type") == Some(&json!("string"))).then(|| json!({ "type": ["string", "null"] }))
        };
        let result = walk(&doc, &mut [&mut fill, &mut tag]);
        assert_eq!(result, json!({ "x": { "type": ["string", "null"] } }));
    }

    #[test]
    fn replacement_subtree_is_walked() {
        let doc = json!({ "a": 0 });
        let mut expand = |path: &[String], node: &Value| {
            (path == ["a"] && node == &json!(0)).then(|| json!({ "inner": 0 }))
        };
        let mut bump = |_: &[String], node: &Value| (node == &json!(0)).then(|| json!(1));
        let result = walk(&doc, &mut [&mut expand, &mut bump]);
        assert_eq!(result, json!({ "a": { "inner": 1 } }));
    }

    #[test]
    fn input_is_untouched() {
        let doc = json!({ "n": 1 });
        let mut zero = |_: &[String], node: &Value| node.is_number().then(|| json!(0));
        let result = walk(&doc, &mut [&mut zero]);
        assert_eq!(doc, json!({ "n": 1 }));
        assert_eq!(result, json!({ "n": 0 }));
    }
}
