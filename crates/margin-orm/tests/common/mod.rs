#![allow(dead_code)]

use margin_orm::{Attributes, Cast, Collection, Connection, Model, Pivot, Related, Result};
use margin_sql_core::QueryLog;
use margin_sqlite::SqliteConnection;

pub const SCHEMA: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
    "CREATE TABLE posts (id INTEGER PRIMARY KEY AUTOINCREMENT, parent_id INTEGER NOT NULL DEFAULT 0, author_id INTEGER NOT NULL, body TEXT NOT NULL, is_pinned INTEGER NOT NULL DEFAULT 0, tags TEXT, created_at TEXT, deleted_at TEXT)",
    "CREATE TABLE post_user (post_id INTEGER NOT NULL, user_id INTEGER NOT NULL, type TEXT NOT NULL, created_at TEXT, updated_at TEXT)",
];

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

impl Model for User {
    const TABLE: &'static str = "users";
    const CASTS: &'static [(&'static str, Cast)] = &[("id", Cast::Integer)];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        Ok(Self {
            id: attrs.integer("id")?,
            name: attrs.text("name"),
        })
    }

    fn key(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostUser {
    pub post_id: i64,
    pub user_id: i64,
    pub kind: String,
}

impl Model for PostUser {
    const TABLE: &'static str = "post_user";
    const PRIMARY_KEY: &'static str = "post_id";
    const CASTS: &'static [(&'static str, Cast)] =
        &[("post_id", Cast::Integer), ("user_id", Cast::Integer)];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        Ok(Self {
            post_id: attrs.integer("post_id")?,
            user_id: attrs.integer("user_id")?,
            kind: attrs.text("type"),
        })
    }

    fn key(&self) -> i64 {
        self.post_id
    }
}

impl Pivot for PostUser {
    const PARENT_COLUMN: &'static str = "post_id";
    const RELATED_COLUMN: &'static str = "user_id";

    fn parent_key(&self) -> i64 {
        self.post_id
    }

    fn related_key(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub parent_id: i64,
    pub author_id: i64,
    pub body: String,
    pub is_pinned: bool,
    pub tags: Collection<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub replies: Collection<Post>,
    pub author: Option<User>,
    pub watchers: Collection<Related<PostUser, User>>,
    pub reply_count: i64,
}

impl Model for Post {
    const TABLE: &'static str = "posts";
    const SOFT_DELETE: Option<&'static str> = Some("deleted_at");
    const CASTS: &'static [(&'static str, Cast)] = &[
        ("id", Cast::Integer),
        ("parent_id", Cast::Integer),
        ("author_id", Cast::Integer),
        ("is_pinned", Cast::Boolean),
        ("tags", Cast::Collection),
        ("created_at", Cast::Timestamp),
        ("reply_count", Cast::Integer),
    ];

    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
        Ok(Self {
            id: attrs.integer("id")?,
            parent_id: attrs.integer("parent_id")?,
            author_id: attrs.integer("author_id")?,
            body: attrs.text("body"),
            is_pinned: attrs.boolean("is_pinned")?,
            tags: attrs.collection("tags")?,
            created_at: attrs.timestamp("created_at")?,
            replies: Collection::new(),
            author: None,
            watchers: Collection::new(),
            reply_count: attrs.integer("reply_count")?,
        })
    }

    fn key(&self) -> i64 {
        self.id
    }
}

pub fn create_test_db() -> QueryLog<SqliteConnection> {
    let conn = SqliteConnection::open_in_memory().expect("Failed to open in-memory SQLite");
    for ddl in SCHEMA {
        conn.execute(ddl, &[]).expect("schema");
    }
    QueryLog::new(conn)
}

pub fn add_user(conn: &dyn Connection, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO users (name) VALUES (?)",
        &[margin_orm::SqlValue::Text(name.to_string())],
    )
    .expect("insert user");
    conn.last_insert_id().expect("user id")
}

pub fn add_post(conn: &dyn Connection, parent_id: i64, author_id: i64, body: &str) -> i64 {
    conn.execute(
        "INSERT INTO posts (parent_id, author_id, body, created_at) VALUES (?, ?, ?, '2024-01-02 03:04:05')",
        &[
            margin_orm::SqlValue::Int(parent_id),
            margin_orm::SqlValue::Int(author_id),
            margin_orm::SqlValue::Text(body.to_string()),
        ],
    )
    .expect("insert post");
    conn.last_insert_id().expect("post id")
}
