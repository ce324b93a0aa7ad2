//! # margin-notes
//!
//! Threaded notes attached to documents, built on `margin-orm`.
//!
//! A thread is a note with `parent_id = 0`; replies point at their thread.
//! Notes are soft-deleted through `trashed_at`. Who has read a note and who
//! it mentions are rows of the typed `notes_users` pivot.
//!
//! ## Loading a document's threads
//!
//! ```ignore
//! use margin_notes::{Note, NoteQueryExt};
//! use margin_orm::{Builder, Model};
//!
//! let threads = Note::objects(&conn)
//!     .threads()
//!     .for_document(document_id)
//!     .only_relevant(current_user)
//!     .with_replies()
//!     .with_author()
//!     .with_mentions()
//!     .with_unread_count(current_user)
//!     .with_permissions(gate, current_user)
//!     .order_by("-notes.created_at")
//!     .get()?;
//! ```
//!
//! The statement count of that call does not depend on how many threads
//! match.

pub mod mentions;
pub mod schema;

mod error;
mod models;
mod ops;
mod query;

pub use error::{NoteError, Result};
pub use models::{
    Document, LinkedUser, Note, NoteUser, RelationType, User, NOTES_TABLE, NOTES_USERS_TABLE,
};
pub use ops::NewNote;
pub use query::{NoteQueryExt, DELETE_NOTE, EDIT_NOTE};
