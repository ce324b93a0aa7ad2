#![allow(dead_code)]

use margin_migrate::{Migrator, SqliteDialect};
use margin_notes::{schema, NewNote, Note};
use margin_orm::{Connection, SqlValue};
use margin_sql_core::QueryLog;
use margin_sqlite::SqliteConnection;

const HOST_TABLES: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, login TEXT NOT NULL, display_name TEXT NOT NULL)",
    "CREATE TABLE documents (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL)",
];

pub fn create_test_db() -> QueryLog<SqliteConnection> {
    let conn = SqliteConnection::open_in_memory().expect("Failed to open in-memory SQLite");
    Migrator::new(&conn, SqliteDialect)
        .apply(&schema::manifest())
        .expect("notes schema");
    for ddl in HOST_TABLES {
        conn.execute(ddl, &[]).expect("host schema");
    }
    QueryLog::new(conn)
}

pub fn add_user(conn: &dyn Connection, login: &str) -> i64 {
    conn.execute(
        "INSERT INTO users (login, display_name) VALUES (?, ?)",
        &[
            SqlValue::Text(login.to_string()),
            SqlValue::Text(login.to_uppercase()),
        ],
    )
    .expect("insert user");
    conn.last_insert_id().expect("user id")
}

pub fn add_document(conn: &dyn Connection, title: &str) -> i64 {
    conn.execute(
        "INSERT INTO documents (title) VALUES (?)",
        &[SqlValue::Text(title.to_string())],
    )
    .expect("insert document");
    conn.last_insert_id().expect("document id")
}

pub fn thread(conn: &dyn Connection, document: i64, user: i64, content: &str) -> i64 {
    Note::create(conn, &NewNote::thread(document, user, content))
        .expect("create thread")
        .id
}

pub fn reply(conn: &dyn Connection, parent: i64, user: i64, content: &str) -> i64 {
    Note::create(conn, &NewNote::reply(parent, user, content))
        .expect("create reply")
        .id
}
