//! Error types for the migration helper.

use std::path::PathBuf;

use margin_sql_core::SqlError;

/// Errors that can occur while planning or applying schema changes.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error while introspecting or running DDL.
    #[error("Database error: {0}")]
    Database(#[from] SqlError),

    /// `create_indexes` named a column the live table does not have.
    #[error("Column '{column}' does not exist on table '{table}'")]
    UnknownColumn {
        /// The table that was introspected.
        table: String,
        /// The missing column.
        column: String,
    },

    /// A table was declared without any column.
    #[error("Table '{0}' has no columns")]
    EmptyTable(String),

    /// Failed to read or write a schema manifest.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error while reading a manifest file.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// Path of the manifest.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
