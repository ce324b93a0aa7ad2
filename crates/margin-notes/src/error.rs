//! Errors raised by note operations.

use margin_orm::OrmError;

/// Errors from creating or changing notes.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// Query, driver or hydration error.
    #[error(transparent)]
    Orm(#[from] OrmError),

    /// The note body is empty after trimming.
    #[error("Note content cannot be empty")]
    EmptyContent,

    /// A reply named a parent that is missing or is itself a reply.
    #[error("Note {0} is not a thread")]
    NotAThread(i64),

    /// A note that was just written could not be read back.
    #[error("Note {0} not found")]
    NotFound(i64),

    /// The driver reported no id for an inserted note.
    #[error("Insert did not report a note id")]
    MissingId,
}

/// Result type alias for note operations.
pub type Result<T> = std::result::Result<T, NoteError>;
