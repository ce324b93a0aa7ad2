//! # margin-orm
//!
//! Typed models on top of `margin-sql-core`.
//!
//! This crate provides:
//! - `Model` trait with a cast declaration applied at hydration time
//! - `ModelQuery`, a query builder that returns models instead of rows
//! - Named eager-loading relations that batch their queries
//! - Loaders for has-many, belongs-to and typed pivot relations
//! - `PivotTable` with `sync`, `attach` and `detach`
//! - `Capability`, the boundary for permission checks
//!
//! ## Eager loading
//!
//! ```ignore
//! use margin_orm::{load_has_many, Builder, Model};
//!
//! let threads = Note::objects(&conn)
//!     .where_eq("parent_id", 0)
//!     .add_with("replies", |conn, parents| {
//!         load_has_many(conn, parents, "parent_id", |r: &Note| r.parent_id, |q| q, |n, r| n.replies = r)
//!     })
//!     .get()?;
//! ```
//!
//! However many threads come back, the replies cost one extra query.

mod capability;
mod cast;
mod error;
mod model;
mod model_query;
mod pivot;
mod relations;

pub use capability::Capability;
pub use cast::{Attributes, Cast};
pub use error::{OrmError, Result};
pub use model::Model;
pub use model_query::{ModelQuery, RelationLoader};
pub use pivot::{Pivot, PivotTable};
pub use relations::{load_belongs_to, load_has_many, load_pivot, Related};

// Re-export commonly used types from margin-sql-core
pub use margin_sql_core::{
    Builder, Collection, CompareOp, Connection, KeyedCollection, Query, Row, SqlValue, ToSqlValue,
};
