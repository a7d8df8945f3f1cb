//! Singer catalog stream selection.
//!
//! A catalog lists the streams a tap can sync. Each stream carries metadata
//! entries addressed by `breadcrumb`; the entry with an empty breadcrumb
//! describes the stream itself and holds its `selected` flag.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CatalogError;

/// Replication method written into a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplicationMethod {
    Incremental,
    FullTable,
    LogBased,
}

impl ReplicationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationMethod::Incremental => "INCREMENTAL",
            ReplicationMethod::FullTable => "FULL_TABLE",
            ReplicationMethod::LogBased => "LOG_BASED",
        }
    }
}

/// Which streams end up selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Select exactly these streams.
    Select(Vec<String>),
    /// Select every stream except these.
    Exclude(Vec<String>),
    /// Select every stream.
    All,
}

/// A metadata record inside a stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breadcrumb: Option<Vec<Value>>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetadataEntry {
    /// True for the entry describing the stream itself.
    pub fn is_root(&self) -> bool {
        self.breadcrumb.as_ref().map_or(true, Vec::is_empty)
    }
}

/// A single catalog stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub stream: String,

    #[serde(default)]
    pub schema: Value,

    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,

    /// Some taps read the method from the stream instead of its metadata.
    /// Existing values are kept as the tap wrote them.
    #[serde(
        rename = "replication-method",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub replication_method: Option<Value>,

    #[serde(
        rename = "forced-replication-method",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub forced_replication_method: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stream {
    /// Metadata of the entry with an explicit `[]` breadcrumb.
    fn root_metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.as_ref().is_some_and(Vec::is_empty))
            .map(|m| &m.metadata)
    }
}

/// A Singer catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<Stream>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    /// Read a catalog from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        serde_json::from_value(value).map_err(|source| CatalogError::InvalidCatalog { source })
    }

    pub fn to_value(&self) -> Result<Value, CatalogError> {
        serde_json::to_value(self).map_err(|source| CatalogError::InvalidCatalog { source })
    }

    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.stream.as_str()).collect()
    }

    /// Fail if any of `names` is not a stream of this catalog.
    pub fn detect_unknown_streams<S: AsRef<str>>(&self, names: &[S]) -> Result<(), CatalogError> {
        let known: BTreeSet<&str> = self.stream_names().into_iter().collect();
        let unknown: BTreeSet<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !known.contains(name))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::UnknownStreams {
                names: unknown.into_iter().map(String::from).collect(),
            })
        }
    }

    /// Set `selected` and replication methods on every stream.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownStreams` if the selection names streams
    /// that are not in the catalog; nothing is modified in that case.
    pub fn apply_selection(
        &mut self,
        selection: &Selection,
        replication_method: Option<ReplicationMethod>,
        forced_replication_method: Option<ReplicationMethod>,
    ) -> Result<(), CatalogError> {
        match selection {
            Selection::Select(names) | Selection::Exclude(names) => {
                self.detect_unknown_streams(names)?
            }
            Selection::All => {}
        }

        for stream in &mut self.streams {
            let selected = match selection {
                Selection::Select(names) => names.contains(&stream.stream),
                Selection::Exclude(names) => !names.contains(&stream.stream),
                Selection::All => true,
            };

            if let Some(method) = replication_method {
                stream.replication_method = Some(method.as_str().into());
            }
            if let Some(method) = forced_replication_method {
                stream.forced_replication_method = Some(method.as_str().into());
            }

            for entry in stream.metadata.iter_mut().filter(|m| m.is_root()) {
                entry
                    .metadata
                    .insert("selected".to_string(), Value::Bool(selected));
                if let Some(method) = replication_method {
                    entry
                        .metadata
                        .insert("replication-method".to_string(), method.as_str().into());
                }
                if let Some(method) = forced_replication_method {
                    entry
                        .metadata
                        .insert("forced-replication-method".to_string(), method.as_str().into());
                }
            }
        }

        Ok(())
    }

    /// Replace every stream schema with `{}`.
    pub fn remove_schemas(&mut self) {
        for stream in &mut self.streams {
            stream.schema = Value::Object(Map::new());
        }
    }

    /// Fixed-width table of stream selection state.
    pub fn summary(&self) -> String {
        let rule = format!(
            "+-{}-+-{}-+-{}-+-{}-+",
            "-".repeat(30),
            "-".repeat(10),
            "-".repeat(20),
            "-".repeat(20)
        );
        let mut out = String::new();
        let _ = writeln!(
            out,
            "| {:<30} | {:^10} | {:^20} | {:^20} |",
            "stream", "selected", "selected-by-default", "replication-method"
        );
        let _ = writeln!(out, "{}", rule);

        for stream in &self.streams {
            let metadata = stream.root_metadata();
            let field = |key: &str| display_field(metadata.and_then(|m| m.get(key)));
            let _ = writeln!(
                out,
                "| {:<30} | {:^10} | {:^20} | {:^20} |",
                stream.stream,
                field("selected"),
                field("selected-by-default"),
                field("replication-method")
            );
        }

        let _ = writeln!(out, "{}", rule);
        out
    }
}

fn display_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
