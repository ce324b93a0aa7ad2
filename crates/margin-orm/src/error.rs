//! Error types for the ORM.

use thiserror::Error;

use crate::cast::Cast;
use margin_sql_core::SqlError;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Error from the query builder or the connection driver.
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// A stored value could not be coerced to the declared cast.
    #[error("cannot cast field `{field}`: {message}")]
    Cast {
        /// Field name.
        field: String,
        /// What went wrong.
        message: String,
    },

    /// A field was read with a different cast than the model declares.
    #[error("field `{field}` is declared as {declared:?} but was read as {requested:?}")]
    CastMismatch {
        /// Field name.
        field: String,
        /// Cast in the model's declaration.
        declared: Cast,
        /// Cast the caller asked for.
        requested: Cast,
    },
}

impl OrmError {
    pub(crate) fn cast(field: &str, message: impl Into<String>) -> Self {
        Self::Cast {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
