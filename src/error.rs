//! Error types for schema loading, fusion, lookup, validation and catalogs.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Errors raised when two schemas cannot be fused.
///
/// Fusion is deterministic, so a conflict recurs identically on retry; the
/// caller has to reconcile one of the inputs by hand.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FuseError {
    #[error("irreconcilable formats at {path}: \"{left}\" vs \"{right}\"")]
    FormatConflict {
        path: String,
        left: String,
        right: String,
    },

    #[error("conflicting values for \"{key}\" at {path}: {left} vs {right}")]
    KeyConflict {
        path: String,
        key: String,
        left: Value,
        right: Value,
    },
}

impl FuseError {
    /// JSON Pointer of the node where the conflict was found.
    pub fn path(&self) -> &str {
        match self {
            Self::FormatConflict { path, .. } | Self::KeyConflict { path, .. } => path,
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Errors while loading documents and schemas.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("not a fusable schema: {source}")]
    NotASchema {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors from dot-path lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("path not found: {path} (no \"{segment}\" in {parent})")]
    NotFound {
        path: String,
        segment: String,
        /// JSON type of the value the segment was looked up in.
        parent: String,
    },
}

impl LookupError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("unknown draft \"{name}\": expected one of {}", expected.join(", "))]
    UnknownDraft {
        name: String,
        expected: Vec<&'static str>,
    },

    #[error("draft {name} is not supported by the validator")]
    UnsupportedDraft { name: String },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
            _ => 2,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors while reading or editing a Singer catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("streams referenced but not in the catalog: {}", names.join(", "))]
    UnknownStreams { names: Vec<String> },

    #[error("invalid catalog: {source}")]
    InvalidCatalog {
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fuse(#[from] FuseError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl Error {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Fuse(e) => e.exit_code(),
            Error::Load(e) => e.exit_code(),
            Error::Lookup(e) => e.exit_code(),
            Error::Validate(e) => e.exit_code(),
            Error::Catalog(e) => e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("schema.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            errors: vec![SchemaError {
                path: "/id".into(),
                message: "\"x\" is not of type \"integer\"".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::UnsupportedDraft { name: "v3".into() };
        assert_eq!(err.exit_code(), 2);

        let err: ValidateError = LoadError::FileNotFound {
            path: PathBuf::from("doc.json"),
        }
        .into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn fuse_error_display() {
        let err = FuseError::FormatConflict {
            path: "/properties/at".into(),
            left: "date-time".into(),
            right: "email".into(),
        };
        assert_eq!(
            err.to_string(),
            "irreconcilable formats at /properties/at: \"date-time\" vs \"email\""
        );
        assert_eq!(err.exit_code(), 1);

        let err = FuseError::KeyConflict {
            path: "/".into(),
            key: "enum".into(),
            left: json!([1, 2]),
            right: json!([3]),
        };
        assert_eq!(
            err.to_string(),
            "conflicting values for \"enum\" at /: [1,2] vs [3]"
        );
        assert_eq!(err.path(), "/");
    }

    #[test]
    fn umbrella_error_keeps_exit_code() {
        let err: Error = CatalogError::UnknownStreams {
            names: vec!["users".into()],
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "streams referenced but not in the catalog: users"
        );
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/buyer/email".into(),
            message: "\"nope\" is not a \"email\"".into(),
        };
        assert_eq!(err.to_string(), "/buyer/email: \"nope\" is not a \"email\"");
    }
}
