//! Schema Fusion
//!
//! Combines JSON Schemas observed under different conditions into a single
//! schema that accepts every value either input accepts.
//!
//! # Example
//!
//! ```
//! use schema_fusion::{fuse, SchemaNode};
//! use serde_json::json;
//!
//! let monday = SchemaNode::from_value(json!({
//!     "type": "object",
//!     "properties": {
//!         "id": { "type": "integer" },
//!         "tags": { "type": "array", "items": { "type": "string" } }
//!     }
//! })).unwrap();
//!
//! let tuesday = SchemaNode::from_value(json!({
//!     "type": "object",
//!     "properties": {
//!         "id": { "type": "string" },
//!         "tags": { "type": "array" }
//!     }
//! })).unwrap();
//!
//! let fused = fuse(&monday, &tuesday).unwrap().to_value();
//!
//! assert_eq!(fused["properties"]["id"]["type"], json!(["integer", "string"]));
//! // `items` declared on one side only become nullable
//! assert_eq!(fused["properties"]["tags"]["items"]["type"], json!(["null", "string"]));
//! ```
//!
//! # Fusion Rules
//!
//! | Key | Both sides declare it | One side declares it |
//! |-----|-----------------------|----------------------|
//! | `type` | union | kept |
//! | `properties` | fused per name | names fuse with `{}` |
//! | `items` | fused | fused with `{"type": ["null"]}` |
//! | `format` | must match | kept |
//! | anything else | must be equal | kept |
//!
//! Mismatches fail with [`FuseError`].

mod catalog;
mod error;
mod fuse;
mod loader;
mod lookup;
mod patch;
mod types;
mod validator;
mod walk;

pub use catalog::{Catalog, MetadataEntry, ReplicationMethod, Selection, Stream};
pub use error::{CatalogError, Error, FuseError, LoadError, LookupError, SchemaError, ValidateError};
pub use fuse::{fuse, fuse_all, fuse_values};
pub use loader::{
    is_url, load_document, load_document_auto, load_document_str, load_schema, schema_from_value,
    DocumentFormat,
};
pub use lookup::{lookup, lookup_dotted};
pub use patch::{check_tap_requirements, AddNulls, FillEmpty, StripKeys, TapIssue, MIN_EMPTY_DEPTH};
pub use types::{json_type_name, SchemaNode, TypeSet, NULL_TYPE};
pub use validator::{validate, Draft};
pub use walk::{walk, Transform};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
