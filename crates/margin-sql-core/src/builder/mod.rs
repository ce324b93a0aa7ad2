//! Query building: predicate trees, query state, the fluent surface and the
//! connection-bound builder.

mod fluent;
mod predicate;
mod query;
mod query_builder;
mod writer;

pub use fluent::Builder;
pub use predicate::{render_clauses, Clause, CompareOp, Connector, Predicate};
pub use query::{
    Join, JoinKind, OrderBy, OrderDirection, Query, SelectItem, SoftDelete, TableRef, TrashedScope,
};
pub use query_builder::QueryBuilder;
pub use writer::SqlWriter;
