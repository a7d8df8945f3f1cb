//! Path lookup inside JSON documents.

use serde_json::Value;

use crate::error::LookupError;
use crate::types::json_type_name;

/// Look up a dot-separated path (e.g. `paths./accounts.get.responses.200`).
///
/// Array elements are addressed by decimal index. An empty path returns the
/// document itself.
pub fn lookup_dotted<'a>(document: &'a Value, path: &str) -> Result<&'a Value, LookupError> {
    if path.is_empty() {
        return Ok(document);
    }
    let segments: Vec<&str> = path.split('.').collect();
    lookup(document, &segments)
}

/// Look up a path given as individual segments.
///
/// # Errors
///
/// Returns `LookupError::NotFound` naming the first segment that could not
/// be resolved.
pub fn lookup<'a, S: AsRef<str>>(
    document: &'a Value,
    segments: &[S],
) -> Result<&'a Value, LookupError> {
    let mut current = document;
    for segment in segments {
        let segment = segment.as_ref();
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| LookupError::NotFound {
            path: join(segments),
            segment: segment.to_string(),
            parent: json_type_name(current).to_string(),
        })?;
    }
    Ok(current)
}

fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "paths": {
                "/accounts": {
                    "get": {
                        "parameters": [{ "name": "limit" }, { "name": "cursor" }]
                    }
                }
            }
        })
    }

    #[test]
    fn dotted_path_through_objects_and_arrays() {
        let doc = doc();
        let found = lookup_dotted(&doc, "paths./accounts.get.parameters.1.name").unwrap();
        assert_eq!(found, "cursor");
    }

    #[test]
    fn empty_path_is_document() {
        let doc = doc();
        assert_eq!(lookup_dotted(&doc, "").unwrap(), &doc);
    }

    #[test]
    fn segments_lookup() {
        let doc = doc();
        let found = lookup(&doc, &["paths", "/accounts", "get"]).unwrap();
        assert!(found.get("parameters").is_some());
    }

    #[test]
    fn missing_key_reports_segment() {
        let doc = doc();
        let err = lookup_dotted(&doc, "paths./users.get").unwrap_err();
        assert_eq!(
            err,
            LookupError::NotFound {
                path: "paths./users.get".into(),
                segment: "/users".into(),
                parent: "object".into(),
            }
        );
    }

    #[test]
    fn index_out_of_range_or_not_numeric() {
        let doc = doc();
        assert!(lookup_dotted(&doc, "paths./accounts.get.parameters.5").is_err());
        assert!(lookup_dotted(&doc, "paths./accounts.get.parameters.first").is_err());
    }

    #[test]
    fn cannot_descend_into_scalar() {
        let doc = json!({ "name": "x" });
        let err = lookup_dotted(&doc, "name.length").unwrap_err();
        assert!(matches!(err, LookupError::NotFound { ref parent, .. } if parent == "string"));
    }
}
