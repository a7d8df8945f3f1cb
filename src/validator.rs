//! Document validation against a JSON Schema draft.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};

/// JSON Schema draft used for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Draft {
    V3,
    V4,
    V6,
    #[default]
    V7,
    V201909,
    V202012,
}

impl Draft {
    pub const ALL: [Draft; 6] = [
        Draft::V201909,
        Draft::V202012,
        Draft::V3,
        Draft::V4,
        Draft::V6,
        Draft::V7,
    ];

    /// Short name, e.g. `v7`.
    pub fn short_name(&self) -> &'static str {
        match self {
            Draft::V3 => "v3",
            Draft::V4 => "v4",
            Draft::V6 => "v6",
            Draft::V7 => "v7",
            Draft::V201909 => "v201909",
            Draft::V202012 => "v202012",
        }
    }

    /// Validator name, e.g. `Draft7Validator`.
    pub fn validator_name(&self) -> &'static str {
        match self {
            Draft::V3 => "Draft3Validator",
            Draft::V4 => "Draft4Validator",
            Draft::V6 => "Draft6Validator",
            Draft::V7 => "Draft7Validator",
            Draft::V201909 => "Draft201909Validator",
            Draft::V202012 => "Draft202012Validator",
        }
    }

    /// Every accepted spelling, short names first.
    pub fn names() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .map(Draft::short_name)
            .chain(Self::ALL.iter().map(Draft::validator_name))
            .collect()
    }

    fn engine(&self) -> Option<jsonschema::Draft> {
        match self {
            Draft::V3 => None,
            Draft::V4 => Some(jsonschema::Draft::Draft4),
            Draft::V6 => Some(jsonschema::Draft::Draft6),
            Draft::V7 => Some(jsonschema::Draft::Draft7),
            Draft::V201909 => Some(jsonschema::Draft::Draft201909),
            Draft::V202012 => Some(jsonschema::Draft::Draft202012),
        }
    }
}

impl FromStr for Draft {
    type Err = ValidateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.short_name() == s || d.validator_name() == s)
            .ok_or_else(|| ValidateError::UnknownDraft {
                name: s.to_string(),
                expected: Self::names(),
            })
    }
}

impl std::fmt::Display for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Validate a document against a schema with format checking enabled.
///
/// Collects every error rather than stopping at the first.
///
/// # Errors
///
/// Returns `ValidateError::UnsupportedDraft` for draft 3,
/// `ValidateError::InvalidSchema` if the schema itself is invalid, or
/// `ValidateError::Invalid` with all errors if the document doesn't match.
pub fn validate(schema: &Value, document: &Value, draft: Draft) -> Result<(), ValidateError> {
    let engine = draft.engine().ok_or_else(|| ValidateError::UnsupportedDraft {
        name: draft.short_name().to_string(),
    })?;

    let validator = jsonschema::options()
        .with_draft(engine)
        .should_validate_formats(true)
        .build(schema)
        .map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}
