//! # margin-sqlite
//!
//! A synchronous SQLite driver for `margin-sql-core`.
//!
//! Identifiers are quoted with double quotes. Values are bound positionally
//! in the order the compiler emits them, and read back by storage class:
//! `INTEGER` as `SqlValue::Int`, `REAL` as `Float`, `TEXT` as `Text`,
//! `BLOB` as `Blob`.
//!
//! ## Example
//!
//! ```rust
//! use margin_sql_core::{Builder, Connection, QueryBuilder, Row};
//! use margin_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_in_memory().unwrap();
//! conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[]).unwrap();
//!
//! let id = QueryBuilder::table(&conn, "users")
//!     .insert(Row::new().with("name", "Ada"))
//!     .unwrap();
//! assert_eq!(id, Some(1));
//!
//! let rows = QueryBuilder::table(&conn, "users").where_eq("name", "Ada").get().unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

mod connection;
mod dialect;

pub use connection::SqliteConnection;
pub use dialect::SqliteDialect;
