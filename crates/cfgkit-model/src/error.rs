//! Error types for config models
//!
//! - [`ValidationError`]: input does not fit the declared fields
//! - [`SchemaError`]: the field table of a model is inconsistent
//! - [`ConfigError`]: everything that can go wrong while building or mutating a model

use crate::duplicate::DuplicateKeyError;
use crate::path::PathError;

/// Input rejected by schema validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Key that the model does not declare
    #[error("{model}: unknown field '{path}'")]
    UnknownField { model: &'static str, path: String },

    /// Required field absent from the input
    #[error("{model}: missing required field '{path}'")]
    MissingField { model: &'static str, path: String },

    /// Sub-config given as something other than a mapping
    #[error("{model}: expected a mapping at '{path}'")]
    ExpectedObject { model: &'static str, path: String },

    /// Value has the wrong type for the field
    #[error("{model}: {source}")]
    Type {
        model: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ValidationError {
    /// Dotted path of the offending field, when known
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownField { path, .. }
            | Self::MissingField { path, .. }
            | Self::ExpectedObject { path, .. } => Some(path),
            Self::Type { .. } => None,
        }
    }
}

/// Inconsistent field table
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Field declared twice
    #[error("{model}: field '{field}' declared more than once")]
    DuplicateField { model: &'static str, field: String },

    /// Replacement path does not parse
    #[error("{model}: replacement for '{field}' is not a valid path: {source}")]
    InvalidPath {
        model: &'static str,
        field: String,
        #[source]
        source: PathError,
    },

    /// Replacement path does not reach a declared field
    #[error("{model}: replacement '{path}' for '{field}' does not name a declared field")]
    UnresolvedPath {
        model: &'static str,
        field: String,
        path: String,
    },

    /// Deprecated field names itself as replacement
    #[error("{model}: deprecated field '{field}' cannot replace itself")]
    SelfReplacement { model: &'static str, field: String },
}

/// Config model errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Deprecated field and its replacement were both supplied
    #[error(
        "cannot provide deprecated parameter '{deprecated}' and replacing parameter '{replacement}' together"
    )]
    Conflict {
        deprecated: String,
        replacement: String,
    },

    /// Conversion function of a deprecated field rejected its value
    #[error("converting deprecated '{field}' for '{replacement}' failed: {message}")]
    Forward {
        field: String,
        replacement: String,
        message: String,
    },

    /// Deprecated field could not be reset
    #[error("removing deprecated '{field}' from config failed: {source}")]
    Removal {
        field: String,
        #[source]
        source: ValidationError,
    },

    /// Forwarded value was rejected by its new field
    #[error("setting '{replacement}' from deprecated '{field}' failed: {source}")]
    Assignment {
        field: String,
        replacement: String,
        #[source]
        source: ValidationError,
    },

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    DuplicateKeys(#[from] DuplicateKeyError),

    /// Default requested for a field the model does not declare
    #[error("'{field}' is not a field in {model}")]
    UnknownField { model: &'static str, field: String },

    /// Default requested for a required field
    #[error("'{field}' is a required field of {model} and does not have a default value")]
    NoDefault { model: &'static str, field: String },

    #[error("invalid field path: {0}")]
    Path(#[from] PathError),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Whether the error comes from misusing the default lookup
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::UnknownField { .. } | Self::NoDefault { .. })
    }
}

/// Result type alias for config model operations
pub type Result<T> = std::result::Result<T, ConfigError>;
