//! Schema fusion - combines two observed schemas into a structural superset.
//!
//! Every value accepted by either input is accepted by the fused schema.
//! Each field kind has its own policy:
//!
//! | Key | Both sides | One side |
//! |-----|------------|----------|
//! | `type` | set union | that side's types |
//! | `properties` | fuse per name | missing names fuse with `{}` |
//! | `items` | fuse | fuse with the null schema |
//! | `format` | must be equal | carried through |
//! | other | must be deeply equal | carried through |
//!
//! A property seen on one side only keeps its own types, while one-sided
//! `items` become nullable.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, FuseError, LoadError};
use crate::types::SchemaNode;

/// Fuse two schemas.
///
/// Pass [`SchemaNode::null`] for a side that has no observation.
///
/// # Errors
///
/// Returns `FuseError::FormatConflict` when both sides declare different
/// `format`s at the same position, and `FuseError::KeyConflict` when any
/// other uninterpreted key differs. No partial result is produced.
///
/// # Example
///
/// ```
/// use schema_fusion::{fuse, SchemaNode};
/// use serde_json::json;
///
/// let a = SchemaNode::from_value(json!({ "type": "string" })).unwrap();
/// let b = SchemaNode::from_value(json!({ "type": ["integer"] })).unwrap();
///
/// let fused = fuse(&a, &b).unwrap();
/// assert_eq!(fused.to_value(), json!({ "type": ["integer", "string"] }));
/// ```
pub fn fuse(a: &SchemaNode, b: &SchemaNode) -> Result<SchemaNode, FuseError> {
    fuse_node(a, b, "")
}

/// Fuse a sequence of schemas left to right.
///
/// The first schema seeds the fold, so a single input comes back unchanged
/// rather than nullable. An empty sequence yields the null schema.
pub fn fuse_all<'a, I>(schemas: I) -> Result<SchemaNode, FuseError>
where
    I: IntoIterator<Item = &'a SchemaNode>,
{
    let mut schemas = schemas.into_iter();
    let Some(first) = schemas.next() else {
        return Ok(SchemaNode::null());
    };

    schemas.try_fold(first.clone(), |acc, next| fuse(&acc, next))
}

/// Fuse two schemas given as raw JSON.
///
/// # Errors
///
/// Returns `Error::Load` if either value is not a well-formed schema node,
/// or `Error::Fuse` on a conflict.
pub fn fuse_values(a: &Value, b: &Value) -> Result<Value, Error> {
    let a = SchemaNode::from_value(a.clone()).map_err(|source| LoadError::NotASchema { source })?;
    let b = SchemaNode::from_value(b.clone()).map_err(|source| LoadError::NotASchema { source })?;
    Ok(fuse(&a, &b)?.to_value())
}

// --- Internal implementation ---

fn fuse_node(a: &SchemaNode, b: &SchemaNode, path: &str) -> Result<SchemaNode, FuseError> {
    Ok(SchemaNode {
        types: a.types.union(&b.types),
        properties: fuse_properties(a.properties.as_ref(), b.properties.as_ref(), path)?,
        items: fuse_items(a.items.as_deref(), b.items.as_deref(), path)?,
        format: fuse_format(a.format.as_ref(), b.format.as_ref(), path)?,
        extra: fuse_extra(&a.extra, &b.extra, path)?,
    })
}

fn fuse_properties(
    a: Option<&BTreeMap<String, SchemaNode>>,
    b: Option<&BTreeMap<String, SchemaNode>>,
    path: &str,
) -> Result<Option<BTreeMap<String, SchemaNode>>, FuseError> {
    if a.is_none() && b.is_none() {
        return Ok(None);
    }

    let empty = BTreeMap::new();
    let a = a.unwrap_or(&empty);
    let b = b.unwrap_or(&empty);
    let placeholder = SchemaNode::default();

    let names: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    let mut result = BTreeMap::new();
    for name in names {
        let prop_path = format!("{}/properties/{}", path, escape_segment(name));
        let fused = fuse_node(
            a.get(name).unwrap_or(&placeholder),
            b.get(name).unwrap_or(&placeholder),
            &prop_path,
        )?;
        result.insert(name.clone(), fused);
    }

    Ok(Some(result))
}

fn fuse_items(
    a: Option<&SchemaNode>,
    b: Option<&SchemaNode>,
    path: &str,
) -> Result<Option<Box<SchemaNode>>, FuseError> {
    let items_path = format!("{}/items", path);
    let null = SchemaNode::null();

    let fused = match (a, b) {
        (None, None) => return Ok(None),
        (Some(a), Some(b)) => fuse_node(a, b, &items_path)?,
        (Some(only), None) | (None, Some(only)) => fuse_node(only, &null, &items_path)?,
    };

    Ok(Some(Box::new(fused)))
}

fn fuse_format(
    a: Option<&String>,
    b: Option<&String>,
    path: &str,
) -> Result<Option<String>, FuseError> {
    match (a, b) {
        (Some(left), Some(right)) if left != right => {
            debug!(path = pointer(path), %left, %right, "format conflict");
            Err(FuseError::FormatConflict {
                path: pointer(path).to_string(),
                left: left.clone(),
                right: right.clone(),
            })
        }
        (Some(format), _) | (None, Some(format)) => Ok(Some(format.clone())),
        (None, None) => Ok(None),
    }
}

fn fuse_extra(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, FuseError> {
    let mut result = a.clone();

    for (key, right) in b {
        match a.get(key) {
            Some(left) if left != right => {
                debug!(path = pointer(path), key = %key, "key conflict");
                return Err(FuseError::KeyConflict {
                    path: pointer(path).to_string(),
                    key: key.clone(),
                    left: left.clone(),
                    right: right.clone(),
                });
            }
            Some(_) => {}
            None => {
                result.insert(key.clone(), right.clone());
            }
        }
    }

    Ok(result)
}

/// Root is reported as `/`, everything else as built.
fn pointer(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Escape a property name for use as a JSON Pointer segment (RFC 6901).
fn escape_segment(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> SchemaNode {
        SchemaNode::from_value(value).unwrap()
    }

    fn types(node: &SchemaNode) -> Vec<&str> {
        node.types.iter().collect()
    }

    #[test]
    fn null_with_null_is_null() {
        let fused = fuse(&SchemaNode::null(), &SchemaNode::null()).unwrap();
        assert_eq!(fused, SchemaNode::null());
    }

    #[test]
    fn types_union_mixed_encodings() {
        let a = node(json!({ "type": "string" }));
        let b = node(json!({ "type": ["null", "string", "integer"] }));
        let fused = fuse(&a, &b).unwrap();
        assert_eq!(types(&fused), vec!["integer", "null", "string"]);
    }

    #[test]
    fn absent_type_contributes_nothing() {
        let a = node(json!({ "type": "boolean" }));
        let fused = fuse(&a, &SchemaNode::default()).unwrap();
        assert_eq!(types(&fused), vec!["boolean"]);
    }

    #[test]
    fn properties_fuse_recursively() {
        let a = node(json!({ "properties": { "x": { "type": "string" } } }));
        let b = node(json!({ "properties": { "x": { "type": "number" } } }));
        let fused = fuse(&a, &b).unwrap();
        let x = &fused.properties.unwrap()["x"];
        assert_eq!(types(x), vec!["number", "string"]);
    }

    #[test]
    fn one_sided_property_is_not_made_nullable() {
        let a = node(json!({ "properties": { "x": { "type": "string" } } }));
        let b = node(json!({ "properties": {} }));
        let fused = fuse(&a, &b).unwrap();
        let x = &fused.properties.unwrap()["x"];
        assert_eq!(types(x), vec!["string"]);
    }

    #[test]
    fn properties_on_one_side_only_still_emitted() {
        let a = node(json!({ "type": "object", "properties": { "x": { "type": "string" } } }));
        let b = node(json!({ "type": "object" }));
        let fused = fuse(&a, &b).unwrap();
        assert_eq!(
            fused.to_value(),
            json!({ "type": ["object"], "properties": { "x": { "type": ["string"] } } })
        );
    }

    #[test]
    fn one_sided_items_become_nullable() {
        let a = node(json!({ "items": { "type": "string" } }));
        let fused = fuse(&a, &SchemaNode::default()).unwrap();
        assert_eq!(types(fused.items.as_ref().unwrap()), vec!["null", "string"]);

        let fused = fuse(&SchemaNode::default(), &a).unwrap();
        assert_eq!(types(fused.items.as_ref().unwrap()), vec!["null", "string"]);
    }

    #[test]
    fn two_sided_items_fuse_without_null() {
        let a = node(json!({ "type": "array", "items": { "type": "string" } }));
        let b = node(json!({ "type": "array", "items": { "type": "integer" } }));
        let fused = fuse(&a, &b).unwrap();
        assert_eq!(types(fused.items.as_ref().unwrap()), vec!["integer", "string"]);
    }

    #[test]
    fn matching_formats_are_kept() {
        let a = node(json!({ "type": "string", "format": "date-time" }));
        let fused = fuse(&a, &a).unwrap();
        assert_eq!(fused.format.as_deref(), Some("date-time"));
    }

    #[test]
    fn one_sided_format_is_carried() {
        let a = node(json!({ "type": "string" }));
        let b = node(json!({ "type": "string", "format": "email" }));
        let fused = fuse(&a, &b).unwrap();
        assert_eq!(fused.format.as_deref(), Some("email"));
    }

    #[test]
    fn format_conflict_reports_path_and_values() {
        let a = node(json!({ "properties": { "at": { "format": "date-time" } } }));
        let b = node(json!({ "properties": { "at": { "format": "email" } } }));
        let err = fuse(&a, &b).unwrap_err();
        assert_eq!(
            err,
            FuseError::FormatConflict {
                path: "/properties/at".into(),
                left: "date-time".into(),
                right: "email".into(),
            }
        );
    }

    #[test]
    fn opaque_keys_pass_through_or_must_match() {
        let a = node(json!({ "enum": [1, 2] }));
        let fused = fuse(&a, &SchemaNode::default()).unwrap();
        assert_eq!(fused.extra["enum"], json!([1, 2]));

        let fused = fuse(&a, &a).unwrap();
        assert_eq!(fused.extra["enum"], json!([1, 2]));

        let b = node(json!({ "enum": [3] }));
        let err = fuse(&a, &b).unwrap_err();
        assert!(matches!(err, FuseError::KeyConflict { ref key, .. } if key == "enum"));
        assert_eq!(err.path(), "/");
    }

    #[test]
    fn conflict_path_inside_items() {
        let a = node(json!({ "items": { "minLength": 1 } }));
        let b = node(json!({ "items": { "minLength": 2 } }));
        let err = fuse(&a, &b).unwrap_err();
        assert_eq!(err.path(), "/items");
    }

    #[test]
    fn conflict_path_escapes_property_names() {
        let a = node(json!({ "properties": { "a/b": { "title": "x" } } }));
        let b = node(json!({ "properties": { "a/b": { "title": "y" } } }));
        let err = fuse(&a, &b).unwrap_err();
        assert_eq!(err.path(), "/properties/a~1b");
    }

    #[test]
    fn fuse_all_folds_without_null_seed() {
        let schemas = vec![
            node(json!({ "type": "string" })),
            node(json!({ "type": "integer" })),
            node(json!({ "type": "boolean" })),
        ];
        let fused = fuse_all(&schemas).unwrap();
        assert_eq!(types(&fused), vec!["boolean", "integer", "string"]);

        let single = fuse_all(&schemas[..1]).unwrap();
        assert_eq!(single, schemas[0]);
    }

    #[test]
    fn fuse_all_of_nothing_is_null() {
        let fused = fuse_all(std::iter::empty()).unwrap();
        assert_eq!(fused, SchemaNode::null());
    }

    #[test]
    fn fuse_values_rejects_malformed_schema() {
        let result = fuse_values(&json!({ "type": 1 }), &json!({}));
        assert!(matches!(result, Err(Error::Load(LoadError::NotASchema { .. }))));
    }

    #[test]
    fn fuse_values_round_trips_json() {
        let fused = fuse_values(
            &json!({ "type": "object", "properties": { "id": { "type": "integer" } } }),
            &json!({ "type": "object", "properties": { "id": { "type": "null" } } }),
        )
        .unwrap();
        assert_eq!(fused["properties"]["id"]["type"], json!(["integer", "null"]));
    }
}
