//! Relations, counts and filters for note queries.
//!
//! Every relation here costs a fixed number of queries regardless of how
//! many notes are fetched: one for replies, author and document, two for
//! readers and mentions, none for the count columns.

use margin_orm::{
    load_belongs_to, load_has_many, load_pivot, Builder, Capability, CompareOp, Model, ModelQuery,
    Query,
};

use crate::models::{Document, Note, NoteUser, RelationType, User, NOTES_USERS_TABLE};

/// Capability checked to set [`Note::can_edit`].
pub const EDIT_NOTE: &str = "edit_note";

/// Capability checked to set [`Note::can_delete`].
pub const DELETE_NOTE: &str = "delete_note";

/// Note-specific builder methods for [`ModelQuery<Note>`].
pub trait NoteQueryExt<'c>: Sized {
    /// Loads each note's non-trashed replies, oldest first, with their
    /// authors.
    #[must_use]
    fn with_replies(self) -> Self;

    /// Loads the author of each note.
    #[must_use]
    fn with_author(self) -> Self;

    /// Loads the document each note is attached to.
    #[must_use]
    fn with_document(self) -> Self;

    /// Loads the users who have read each note.
    #[must_use]
    fn with_readers(self) -> Self;

    /// Loads the users each note mentions.
    #[must_use]
    fn with_mentions(self) -> Self;

    /// Adds `reply_count`, the number of non-trashed replies.
    #[must_use]
    fn with_reply_count(self) -> Self;

    /// Adds `unread_count`: notes of the thread, itself included, that are
    /// not trashed, not written by `user` and not read by `user`.
    #[must_use]
    fn with_unread_count(self, user: i64) -> Self;

    /// Sets `can_edit` and `can_delete` for `actor` on every note and on any
    /// replies loaded before this call.
    #[must_use]
    fn with_permissions<G>(self, gate: G, actor: i64) -> Self
    where
        G: Capability + 'c;

    /// Keeps threads only.
    #[must_use]
    fn threads(self) -> Self;

    /// Keeps notes attached to `document`.
    #[must_use]
    fn for_document(self, document: i64) -> Self;

    /// Keeps notes `user` has a stake in: written by them, replied to by
    /// them, mentioning them, or with a non-trashed reply mentioning them.
    #[must_use]
    fn only_relevant(self, user: i64) -> Self;
}

impl<'c> NoteQueryExt<'c> for ModelQuery<'c, Note> {
    fn with_replies(self) -> Self {
        self.add_with("replies", |conn, notes| {
            load_has_many(
                conn,
                notes,
                "parent_id",
                |reply: &Note| reply.parent_id,
                |q| q.order_by("notes.created_at").order_by("notes.id").with_author(),
                |note, replies| note.replies = replies,
            )
        })
    }

    fn with_author(self) -> Self {
        self.add_with("author", |conn, notes| {
            load_belongs_to(
                conn,
                notes,
                |note: &Note| note.user_id,
                |q| q,
                |note, author: Option<User>| note.author = author,
            )
        })
    }

    fn with_document(self) -> Self {
        self.add_with("document", |conn, notes| {
            load_belongs_to(
                conn,
                notes,
                |note: &Note| note.document_id,
                |q| q,
                |note, document: Option<Document>| note.document = document,
            )
        })
    }

    fn with_readers(self) -> Self {
        self.add_with("readers", |conn, notes| {
            load_pivot::<Note, NoteUser, User, _>(
                conn,
                notes,
                RelationType::Read.as_str(),
                |note, readers| note.readers = readers,
            )
        })
    }

    fn with_mentions(self) -> Self {
        self.add_with("mentions", |conn, notes| {
            load_pivot::<Note, NoteUser, User, _>(
                conn,
                notes,
                RelationType::Mention.as_str(),
                |note, mentions| note.mentions = mentions,
            )
        })
    }

    fn with_reply_count(self) -> Self {
        self.add_sub_select("reply_count", |q| {
            q.select_raw(&["COUNT(*)"])
                .from_as(Note::TABLE, "counted_reply")
                .where_column("counted_reply.parent_id", CompareOp::Eq, "notes.id")
                .where_null("counted_reply.trashed_at")
        })
    }

    fn with_unread_count(self, user: i64) -> Self {
        self.add_sub_select("unread_count", |q| {
            q.select_raw(&["COUNT(*)"])
                .from_as(Note::TABLE, "unread")
                .where_group(|g| {
                    g.where_column("unread.id", CompareOp::Eq, "notes.id")
                        .or_where_column("unread.parent_id", CompareOp::Eq, "notes.id")
                })
                .where_null("unread.trashed_at")
                .and_where("unread.user_id", CompareOp::Ne, user)
                .where_not_exists(|read| {
                    pivot_exists(read, "unread.id", user, RelationType::Read)
                })
        })
    }

    fn with_permissions<G>(self, gate: G, actor: i64) -> Self
    where
        G: Capability + 'c,
    {
        self.add_with("permissions", move |_conn, notes| {
            let flag = |note: &mut Note| {
                note.can_edit = gate.can(actor, EDIT_NOTE, Some(note.id));
                note.can_delete = gate.can(actor, DELETE_NOTE, Some(note.id));
            };
            Ok(notes.map(|mut note| {
                flag(&mut note);
                note.replies.iter_mut().for_each(flag);
                note
            }))
        })
    }

    fn threads(self) -> Self {
        self.where_eq("notes.parent_id", 0)
    }

    fn for_document(self, document: i64) -> Self {
        self.where_eq("notes.document_id", document)
    }

    fn only_relevant(self, user: i64) -> Self {
        self.where_group(|g| {
            g.where_eq("notes.user_id", user)
                .or_where_exists(|q| {
                    q.select_raw(&["1"])
                        .from_as(Note::TABLE, "replied")
                        .where_column("replied.parent_id", CompareOp::Eq, "notes.id")
                        .where_eq("replied.user_id", user)
                })
                // Mentions on the thread count even when it is trashed.
                .or_where_exists(|q| pivot_exists(q, "notes.id", user, RelationType::Mention))
                .or_where_exists(|q| {
                    q.select_raw(&["1"])
                        .from_as(Note::TABLE, "mentioning_reply")
                        .join(NOTES_USERS_TABLE, None, |on| {
                            on.where_column(
                                "notes_users.note_id",
                                CompareOp::Eq,
                                "mentioning_reply.id",
                            )
                        })
                        .where_column("mentioning_reply.parent_id", CompareOp::Eq, "notes.id")
                        .where_null("mentioning_reply.trashed_at")
                        .where_eq("notes_users.user_id", user)
                        .where_eq("notes_users.type", RelationType::Mention.as_str())
                })
        })
    }
}

/// `SELECT 1 FROM notes_users` linking `note_column` to `user` by `kind`.
fn pivot_exists(q: Query, note_column: &str, user: i64, kind: RelationType) -> Query {
    q.select_raw(&["1"])
        .from(NOTES_USERS_TABLE)
        .where_column("notes_users.note_id", CompareOp::Eq, note_column)
        .where_eq("notes_users.user_id", user)
        .where_eq("notes_users.type", kind.as_str())
}

#[cfg(test)]
mod tests {
    use margin_orm::{Connection, Row, SqlValue};

    use super::*;

    struct Offline;

    impl Connection for Offline {
        fn select(&self, _sql: &str, _params: &[SqlValue]) -> margin_sql_core::Result<Vec<Row>> {
            Ok(Vec::new())
        }

        fn execute(&self, _sql: &str, _params: &[SqlValue]) -> margin_sql_core::Result<u64> {
            Ok(0)
        }

        fn last_insert_id(&self) -> Option<i64> {
            None
        }
    }

    #[test]
    fn test_threads_for_document_sql() {
        let (sql, params) = Note::objects(&Offline).threads().for_document(4).to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM `notes` WHERE `notes`.`parent_id` = ? AND `notes`.`document_id` = ? AND `notes`.`trashed_at` IS NULL"
        );
        assert_eq!(params, vec![SqlValue::Int(0), SqlValue::Int(4)]);
    }

    #[test]
    fn test_only_relevant_keeps_both_mention_checks() {
        let (sql, params) = Note::objects(&Offline).only_relevant(9).to_sql();
        assert!(sql.contains("WHERE (`notes`.`user_id` = ? OR EXISTS ("));
        assert!(sql.contains(
            "INNER JOIN `notes_users` ON `notes_users`.`note_id` = `mentioning_reply`.`id`"
        ));
        assert!(sql.contains("`mentioning_reply`.`trashed_at` IS NULL"));
        assert_eq!(sql.matches("trashed_at").count(), 2);
        assert_eq!(
            params,
            vec![
                SqlValue::Int(9),
                SqlValue::Int(9),
                SqlValue::Int(9),
                SqlValue::Text("mention".into()),
                SqlValue::Int(9),
                SqlValue::Text("mention".into()),
            ]
        );
    }

    #[test]
    fn test_unread_count_is_added_once() {
        let (sql, params) = Note::objects(&Offline)
            .with_unread_count(2)
            .with_unread_count(2)
            .to_sql();
        assert_eq!(sql.matches("AS `unread_count`").count(), 1);
        assert!(sql.starts_with("SELECT `notes`.*, (SELECT COUNT(*) FROM `notes` AS `unread`"));
        assert_eq!(
            params,
            vec![SqlValue::Int(2), SqlValue::Int(2), SqlValue::Text("read".into())]
        );
    }

    #[test]
    fn test_relations_register_under_their_keys() {
        let query = Note::objects(&Offline)
            .with_replies()
            .with_author()
            .with_readers()
            .with_permissions(|_: i64, _: &str, _: Option<i64>| true, 1);
        for key in ["replies", "author", "readers", "permissions"] {
            assert!(query.has_relation(key), "{key}");
        }
        assert!(!query.has_relation("mentions"));
    }
}
