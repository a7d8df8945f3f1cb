//! Core types for schema fusion.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The null type name, injected by the `items` defaulting rule.
pub const NULL_TYPE: &str = "null";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Set of primitive type names declared by a schema node.
///
/// Accepts both `"string"` and `["string", "null"]` on input and always
/// serializes as a list. Members are kept sorted so output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeSet(BTreeSet<String>);

impl TypeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Members present in either set.
    pub fn union(&self, other: &TypeSet) -> TypeSet {
        TypeSet(self.0.union(&other.0).cloned().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for TypeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TypeSet(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRepr {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for TypeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match TypeRepr::deserialize(deserializer)? {
            TypeRepr::One(name) => std::iter::once(name).collect(),
            TypeRepr::Many(names) => names.into_iter().collect(),
        })
    }
}

impl Serialize for TypeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.0)
    }
}

/// A JSON Schema node as understood by the fusion engine.
///
/// Only `type`, `properties`, `items` and `format` are interpreted; all
/// other keys land in [`SchemaNode::extra`] and are carried through verbatim.
/// A node without `type` is the untyped placeholder `{}`, which is not the
/// same thing as [`SchemaNode::null`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "TypeSet::is_empty")]
    pub types: TypeSet,

    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<BTreeMap<String, SchemaNode>>,

    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub items: Option<Box<SchemaNode>>,

    #[serde(
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub format: Option<String>,

    /// Keys the engine does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaNode {
    /// The canonical null schema, `{"type": ["null"]}`.
    pub fn null() -> Self {
        Self::with_types([NULL_TYPE])
    }

    /// A node declaring only the given types.
    pub fn with_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Convert from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Convert into a JSON value.
    ///
    /// Keys come out in the same order as the `Serialize` impl writes them.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if !self.types.is_empty() {
            map.insert(
                "type".to_string(),
                self.types.iter().map(Value::from).collect(),
            );
        }
        if let Some(properties) = &self.properties {
            let properties = properties
                .iter()
                .map(|(name, node)| (name.clone(), node.to_value()))
                .collect();
            map.insert("properties".to_string(), Value::Object(properties));
        }
        if let Some(items) = &self.items {
            map.insert("items".to_string(), items.to_value());
        }
        if let Some(format) = &self.format {
            map.insert("format".to_string(), Value::from(format.as_str()));
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// A present key must hold a value of the field's shape; `null` is rejected
/// instead of being read as absent.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
