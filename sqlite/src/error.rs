//! Error types for the SQLite adapter.

use thiserror::Error;

/// Errors that can occur while reading or writing mapped models.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Row to model (or model to row) mapping failure.
    #[error("mapping error: {0}")]
    MappingError(#[from] rowbind_core::MappingError),

    /// A stored value could not be read as the column's declared type.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Table or column name contains invalid characters.
    #[error("invalid identifier '{0}': must contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),

    /// The model holds no value for the key column of an update.
    #[error("no value for key column: {0}")]
    MissingKey(String),

    /// The table does not exist or has no columns.
    #[error("table not found: {0}")]
    TableNotFound(String),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
