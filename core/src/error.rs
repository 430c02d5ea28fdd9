//! Error types for mapping operations.
//!
//! A missing converter is deliberately not an error: the mapper logs it and
//! leaves the field untouched. Everything below aborts the current call.

use thiserror::Error;

/// Errors that can occur while mapping rows to models or models to rows.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A converter (or a typed field) rejected a value.
    #[error("cannot convert {from} to {to}: {reason}")]
    ConversionError {
        from: String,
        to: String,
        reason: String,
    },

    /// No instantiator is registered for the model type, or its factory
    /// failed.
    #[error("cannot construct {0}")]
    ConstructionError(String),

    /// Reading or writing a field on a model instance failed.
    #[error("cannot access field '{field}' of {model}: {reason}")]
    FieldAccessError {
        model: String,
        field: String,
        reason: String,
    },

    /// A model descriptor was declared inconsistently (duplicate fields,
    /// more than one leftover collector).
    #[error("invalid model descriptor: {0}")]
    InvalidModel(String),

    /// A row was asked to hold a cell it has no column for.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O failure while reading or writing configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl MappingError {
    pub(crate) fn conversion(
        from: impl ToString,
        to: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        MappingError::ConversionError {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn field_access(model: &str, field: &str, reason: impl Into<String>) -> Self {
        MappingError::FieldAccessError {
            model: model.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results with [`MappingError`].
pub type Result<T> = std::result::Result<T, MappingError>;
