//! Database error types.

use thiserror::Error;

/// Recoverable persistence errors.
///
/// Programmer errors (duplicate fields, duplicate task tables, undeclared
/// field names) are not represented here: they panic.
#[derive(Error, Debug)]
pub enum DbError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A mandatory or primary-key field was null at save time
    #[error("Field '{field}' in table '{table}' is mandatory but null")]
    MandatoryFieldNull { table: String, field: String },

    /// UPDATE matched no row for the record's primary key
    #[error("Record with primary key {pk} not found in table '{table}'")]
    RecordNotFound { table: String, pk: i64 },

    /// Type name read from storage is not a known field type
    #[error("Unknown field type '{0}'")]
    UnknownFieldType(String),

    /// I/O error reading configuration
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
