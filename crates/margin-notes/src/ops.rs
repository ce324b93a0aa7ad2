//! Creating and changing notes.
//!
//! Statements run one after another without a transaction; wrap calls in
//! one on the connection if atomicity matters.

use chrono::Utc;
use tracing::{debug, info};

use margin_orm::{Builder, Collection, CompareOp, Connection, Model, PivotTable, Query, Row};

use crate::error::{NoteError, Result};
use crate::mentions;
use crate::models::{Note, NoteUser, RelationType, User};
use crate::query::NoteQueryExt;

/// Input for [`Note::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub document_id: i64,
    pub parent_id: i64,
    pub user_id: i64,
    pub content: String,
}

impl NewNote {
    /// A new thread on `document`.
    pub fn thread(document_id: i64, user_id: i64, content: impl Into<String>) -> Self {
        Self {
            document_id,
            parent_id: 0,
            user_id,
            content: content.into(),
        }
    }

    /// A reply to the thread `parent_id`.
    pub fn reply(parent_id: i64, user_id: i64, content: impl Into<String>) -> Self {
        Self {
            document_id: 0,
            parent_id,
            user_id,
            content: content.into(),
        }
    }
}

impl Note {
    /// Stores a note, links the users it `@mentions`, marks it read for its
    /// author and returns it with its author and mentions loaded.
    ///
    /// A reply takes the document of its thread.
    ///
    /// # Errors
    ///
    /// [`NoteError::EmptyContent`] for blank content and
    /// [`NoteError::NotAThread`] when the parent is missing, trashed or a
    /// reply. Database errors propagate.
    pub fn create(conn: &dyn Connection, new: &NewNote) -> Result<Self> {
        let content = new.content.trim();
        if content.is_empty() {
            return Err(NoteError::EmptyContent);
        }

        let mut document_id = new.document_id;
        if new.parent_id > 0 {
            let parent = Self::objects(conn)
                .find(new.parent_id)?
                .filter(Self::is_thread)
                .ok_or(NoteError::NotAThread(new.parent_id))?;
            document_id = parent.document_id;
        }

        let now = Utc::now();
        let id = Self::objects(conn)
            .insert(
                Row::new()
                    .with("document_id", document_id)
                    .with("parent_id", new.parent_id)
                    .with("user_id", new.user_id)
                    .with("content", content)
                    .with("is_resolved", false)
                    .with("created_at", now)
                    .with("updated_at", now),
            )?
            .ok_or(NoteError::MissingId)?;
        info!(note = id, document = document_id, parent = new.parent_id, "Created note");

        let logins = mentions::parse(content);
        if !logins.is_empty() {
            let users: Collection<i64> = User::objects(conn)
                .where_in("users.login", logins)
                .get()?
                .pluck(Model::key)
                .filter(|user| *user != new.user_id);
            Self::sync_mentions(conn, id, users)?;
        }
        Self::mark_read(conn, id, new.user_id)?;

        Self::objects(conn)
            .with_author()
            .with_mentions()
            .find(id)?
            .ok_or(NoteError::NotFound(id))
    }

    /// Marks the thread `id` resolved. Returns whether a thread changed.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn resolve(conn: &dyn Connection, id: i64) -> Result<bool> {
        Self::set_resolved(conn, id, true)
    }

    /// Reopens the resolved thread `id`. Returns whether a thread changed.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn reopen(conn: &dyn Connection, id: i64) -> Result<bool> {
        Self::set_resolved(conn, id, false)
    }

    /// Moves a note to the trash; trashing a thread trashes its replies.
    /// Returns the number of notes trashed.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn trash(conn: &dyn Connection, id: i64) -> Result<u64> {
        let trashed = Self::objects(conn)
            .where_group(|q| note_and_replies(q, id))
            .update(Row::new().with("trashed_at", Utc::now()))?;
        info!(note = id, trashed, "Trashed note");
        Ok(trashed)
    }

    /// Takes a note, and a thread's replies, out of the trash. Returns the
    /// number of notes restored.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn restore(conn: &dyn Connection, id: i64) -> Result<u64> {
        let restored = Self::objects(conn)
            .only_trashed()
            .where_group(|q| note_and_replies(q, id))
            .update(Row::new().with("trashed_at", None::<String>))?;
        info!(note = id, restored, "Restored note");
        Ok(restored)
    }

    /// Permanently deletes a thread, its replies and their pivot rows,
    /// trashed or not. Returns the number of notes deleted.
    ///
    /// # Errors
    ///
    /// Propagates database errors. A failure after the pivot rows are gone
    /// leaves the notes in place.
    pub fn delete_thread(conn: &dyn Connection, id: i64) -> Result<u64> {
        let ids = Self::objects(conn)
            .with_trashed()
            .select(&["notes.id"])
            .where_group(|q| note_and_replies(q, id))
            .get()?
            .pluck(Model::key);
        if ids.is_empty() {
            return Ok(0);
        }

        let links = NoteUser::objects(conn)
            .where_in("notes_users.note_id", ids.iter().copied())
            .delete()?;
        let deleted = Self::objects(conn)
            .with_trashed()
            .where_in("notes.id", ids)
            .delete()?;
        info!(thread = id, deleted, links, "Deleted thread");
        Ok(deleted)
    }

    /// Records that `user` has read note `id`. Returns `false` if it was
    /// already recorded.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn mark_read(conn: &dyn Connection, id: i64, user: i64) -> Result<bool> {
        let fresh =
            PivotTable::<NoteUser>::new(conn, id, RelationType::Read.as_str()).attach([user])?;
        Ok(!fresh.is_empty())
    }

    /// Makes the users mentioned by note `id` exactly `users` and returns
    /// the ones newly mentioned.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn sync_mentions(
        conn: &dyn Connection,
        id: i64,
        users: impl IntoIterator<Item = i64>,
    ) -> Result<Collection<i64>> {
        let fresh =
            PivotTable::<NoteUser>::new(conn, id, RelationType::Mention.as_str()).sync(users)?;
        debug!(note = id, added = fresh.len(), "Synced mentions");
        Ok(fresh)
    }

    fn set_resolved(conn: &dyn Connection, id: i64, resolved: bool) -> Result<bool> {
        let changed = Self::objects(conn)
            .where_eq("notes.id", id)
            .threads()
            .and_where("notes.is_resolved", CompareOp::Ne, resolved)
            .update(
                Row::new()
                    .with("is_resolved", resolved)
                    .with("updated_at", Utc::now()),
            )?;
        Ok(changed > 0)
    }
}

/// `notes.id = ? OR notes.parent_id = ?`
fn note_and_replies(q: Query, id: i64) -> Query {
    q.where_eq("notes.id", id)
        .or_where("notes.parent_id", CompareOp::Eq, id)
}
