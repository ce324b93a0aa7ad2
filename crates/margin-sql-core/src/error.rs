//! Error types for query building and execution.

use thiserror::Error;

/// Boxed error raised by a connection driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the query builder or propagated from the driver.
#[derive(Debug, Error)]
pub enum SqlError {
    /// UPDATE or DELETE without any WHERE clause. Raised before any SQL is sent.
    #[error("refusing to run {statement} on `{table}` without a WHERE clause")]
    UnconstrainedMutation {
        /// Statement kind ("UPDATE" or "DELETE").
        statement: &'static str,
        /// Target table.
        table: String,
    },

    /// A terminal operation needs a table but none was set with `from`.
    #[error("no table selected for {0}")]
    MissingTable(&'static str),

    /// INSERT or UPDATE with no columns.
    #[error("{0} requires at least one column")]
    EmptyFields(&'static str),

    /// INSERT of several rows whose column lists differ.
    #[error("all rows of a multi-row INSERT must share the same columns")]
    MismatchedRows,

    /// Error reported by the connection driver, passed through untouched.
    #[error("database error: {0}")]
    Driver(#[source] DriverError),
}

impl SqlError {
    /// Wraps a driver error.
    pub fn driver(err: impl Into<DriverError>) -> Self {
        Self::Driver(err.into())
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, SqlError>;
