//! Note, user and document models and the `notes_users` pivot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use margin_orm::{Attributes, Cast, Collection, Model, OrmError, Pivot, Related, Result};

/// Table holding threads and replies.
pub const NOTES_TABLE: &str = "notes";

/// Pivot table linking notes to users.
pub const NOTES_USERS_TABLE: &str = "notes_users";

/// Kind of link between a note and a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// The user has read the note.
    Read,
    /// The note mentions the user.
    Mention,
}

impl RelationType {
    /// Value stored in the pivot's `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Mention => "mention",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "mention" => Ok(Self::Mention),
            other => Err(format!("unknown relation type `{other}`")),
        }
    }
}

/// A site user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub display_name: String,
}

impl Model for User {
    const TABLE: &'static str = "users";
    const CASTS: &'static [(&'static str, Cast)] = &[("id", Cast::Integer)];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        Ok(Self {
            id: attrs.integer("id")?,
            login: attrs.text("login"),
            display_name: attrs.text("display_name"),
        })
    }

    fn key(&self) -> i64 {
        self.id
    }
}

/// A document notes are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
}

impl Model for Document {
    const TABLE: &'static str = "documents";
    const CASTS: &'static [(&'static str, Cast)] = &[("id", Cast::Integer)];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        Ok(Self {
            id: attrs.integer("id")?,
            title: attrs.text("title"),
        })
    }

    fn key(&self) -> i64 {
        self.id
    }
}

/// One row of `notes_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteUser {
    pub note_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for NoteUser {
    const TABLE: &'static str = NOTES_USERS_TABLE;
    const PRIMARY_KEY: &'static str = "note_id";
    const CASTS: &'static [(&'static str, Cast)] = &[
        ("note_id", Cast::Integer),
        ("user_id", Cast::Integer),
        ("created_at", Cast::Timestamp),
    ];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        let kind = attrs
            .text("type")
            .parse()
            .map_err(|message| OrmError::Cast {
                field: "type".to_string(),
                message,
            })?;
        Ok(Self {
            note_id: attrs.integer("note_id")?,
            user_id: attrs.integer("user_id")?,
            kind,
            created_at: attrs.timestamp("created_at")?,
        })
    }

    fn key(&self) -> i64 {
        self.note_id
    }
}

impl Pivot for NoteUser {
    const PARENT_COLUMN: &'static str = "note_id";
    const RELATED_COLUMN: &'static str = "user_id";

    fn parent_key(&self) -> i64 {
        self.note_id
    }

    fn related_key(&self) -> i64 {
        self.user_id
    }
}

/// A user linked to a note through the pivot.
pub type LinkedUser = Related<NoteUser, User>;

/// A thread (`parent_id == 0`) or a reply to one.
///
/// Only the stored columns are hydrated; the relation fields start empty and
/// are filled by the loaders of [`NoteQueryExt`](crate::NoteQueryExt).
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: i64,
    pub document_id: i64,
    pub parent_id: i64,
    pub user_id: i64,
    pub content: String,
    pub is_resolved: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub trashed_at: Option<DateTime<Utc>>,

    pub replies: Collection<Note>,
    pub author: Option<User>,
    pub document: Option<Document>,
    pub readers: Collection<LinkedUser>,
    pub mentions: Collection<LinkedUser>,
    pub reply_count: i64,
    pub unread_count: i64,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Note {
    /// Returns whether this note starts a thread.
    #[must_use]
    pub const fn is_thread(&self) -> bool {
        self.parent_id == 0
    }

    /// Returns whether the note is in the trash.
    #[must_use]
    pub const fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }

    /// The thread this note belongs to.
    #[must_use]
    pub const fn thread_id(&self) -> i64 {
        if self.is_thread() {
            self.id
        } else {
            self.parent_id
        }
    }
}

impl Model for Note {
    const TABLE: &'static str = NOTES_TABLE;
    const SOFT_DELETE: Option<&'static str> = Some("trashed_at");
    const CASTS: &'static [(&'static str, Cast)] = &[
        ("id", Cast::Integer),
        ("document_id", Cast::Integer),
        ("parent_id", Cast::Integer),
        ("user_id", Cast::Integer),
        ("is_resolved", Cast::Boolean),
        ("created_at", Cast::Timestamp),
        ("updated_at", Cast::Timestamp),
        ("trashed_at", Cast::Timestamp),
        ("reply_count", Cast::Integer),
        ("unread_count", Cast::Integer),
    ];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        Ok(Self {
            id: attrs.integer("id")?,
            document_id: attrs.integer("document_id")?,
            parent_id: attrs.integer("parent_id")?,
            user_id: attrs.integer("user_id")?,
            content: attrs.text("content"),
            is_resolved: attrs.boolean("is_resolved")?,
            created_at: attrs.timestamp("created_at")?,
            updated_at: attrs.timestamp("updated_at")?,
            trashed_at: attrs.timestamp("trashed_at")?,
            replies: Collection::new(),
            author: None,
            document: None,
            readers: Collection::new(),
            mentions: Collection::new(),
            reply_count: attrs.integer("reply_count")?,
            unread_count: attrs.integer("unread_count")?,
            can_edit: false,
            can_delete: false,
        })
    }

    fn key(&self) -> i64 {
        self.id
    }
}
