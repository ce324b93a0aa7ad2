//! # margin-sql-core
//!
//! A fluent SQL query builder over a synchronous connection.
//!
//! This crate provides:
//! - `Collection`, the ordered container every query returns
//! - A predicate tree for WHERE, HAVING and JOIN ON, rendered by one walker
//! - `Query` state that compiles to SQL plus positional parameters
//! - The `Connection` boundary and a `QueryLog` that counts round-trips
//!
//! ## Building and compiling
//!
//! ```rust
//! use margin_sql_core::{Builder, CompareOp, Query, SqlValue};
//!
//! let (sql, params) = Query::new()
//!     .from("notes")
//!     .where_eq("parent_id", 0)
//!     .or_where_group(|q| q.where_eq("author_id", 3).where_null("trashed_at"))
//!     .to_sql();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM `notes` WHERE `parent_id` = ? OR (`author_id` = ? AND `trashed_at` IS NULL)"
//! );
//! assert_eq!(params, vec![SqlValue::Int(0), SqlValue::Int(3)]);
//! # let _ = CompareOp::Eq;
//! ```
//!
//! ## SQL injection prevention
//!
//! Values are always bound as parameters. Identifiers come from calling code
//! and are quoted, never bound:
//!
//! ```rust
//! use margin_sql_core::{Builder, Query};
//!
//! let user_input = "'; DROP TABLE notes; --";
//! let (sql, params) = Query::new().from("notes").where_eq("content", user_input).to_sql();
//! assert_eq!(sql, "SELECT * FROM `notes` WHERE `content` = ?");
//! assert_eq!(params.len(), 1);
//! ```

pub mod builder;
pub mod collection;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod row;
pub mod schema;
pub mod value;

pub use builder::{
    Builder, Clause, CompareOp, Connector, Predicate, Query, QueryBuilder, TrashedScope,
};
pub use collection::{Collection, KeyedCollection};
pub use connection::{Connection, LoggedStatement, QueryLog};
pub use dialect::{Dialect, MySqlDialect};
pub use error::{DriverError, Result, SqlError};
pub use row::Row;
pub use schema::ColumnInfo;
pub use value::{SqlValue, ToSqlValue, DATETIME_FORMAT};
