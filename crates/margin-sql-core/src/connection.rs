//! The connection boundary.
//!
//! The builder never owns a connection. Callers hand a `&dyn Connection` to
//! every builder they create; pooling, transactions and timeouts belong to
//! the driver behind this trait.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::dialect::{Dialect, MySqlDialect};
use crate::error::Result;
use crate::row::Row;
use crate::schema::ColumnInfo;
use crate::value::SqlValue;

/// A synchronous database connection.
///
/// Parameters are bound positionally, in the order produced by the compiler.
pub trait Connection {
    /// Runs a statement that returns rows.
    fn select(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Runs a statement that does not return rows; returns the affected count.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Returns the id generated by the most recent INSERT.
    fn last_insert_id(&self) -> Option<i64>;

    /// Returns the dialect used to quote identifiers.
    fn dialect(&self) -> &dyn Dialect {
        &MySqlDialect
    }

    /// Quotes a table or column name.
    fn escape_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }

    /// Introspects the columns of an existing table.
    ///
    /// Returns an empty list when the table does not exist.
    fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let sql = format!("SHOW COLUMNS FROM {}", self.escape_identifier(table));
        let rows = self.select(&sql, &[])?;
        Ok(rows.iter().filter_map(ColumnInfo::from_show_columns).collect())
    }
}

impl<C: Connection + ?Sized> Connection for &C {
    fn select(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        (**self).select(sql, params)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn last_insert_id(&self) -> Option<i64> {
        (**self).last_insert_id()
    }

    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        (**self).describe_table(table)
    }
}

/// A statement seen by a [`QueryLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedStatement {
    /// SQL text.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<SqlValue>,
}

/// Wraps a connection and records every statement sent through it.
///
/// Used to assert how many round-trips an operation costs.
#[derive(Debug)]
pub struct QueryLog<C> {
    inner: C,
    statements: Mutex<Vec<LoggedStatement>>,
}

impl<C: Connection> QueryLog<C> {
    /// Starts logging statements sent to `inner`.
    pub const fn new(inner: C) -> Self {
        Self {
            inner,
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Returns the wrapped connection.
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of statements recorded so far.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Copies out the recorded statements.
    pub fn statements(&self) -> Vec<LoggedStatement> {
        self.lock().clone()
    }

    /// Forgets every recorded statement.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn record(&self, sql: &str, params: &[SqlValue]) {
        debug!(sql = %sql, params = params.len(), "query");
        self.lock().push(LoggedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoggedStatement>> {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Connection> Connection for QueryLog<C> {
    fn select(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.record(sql, params);
        self.inner.select(sql, params)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.record(sql, params);
        self.inner.execute(sql, params)
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.inner.last_insert_id()
    }

    fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect()
    }

    fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        self.inner.describe_table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Connection for Empty {
        fn select(&self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>> {
            Ok(vec![Row::new()
                .with("Field", "title")
                .with("Type", "varchar(300)")
                .with("Key", "")])
        }

        fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<u64> {
            Ok(0)
        }

        fn last_insert_id(&self) -> Option<i64> {
            None
        }
    }

    #[test]
    fn test_query_log_records_statements() {
        let log = QueryLog::new(Empty);
        log.select("SELECT 1", &[]).expect("select");
        log.execute("DELETE FROM t WHERE id = ?", &[SqlValue::Int(3)])
            .expect("execute");
        assert_eq!(log.count(), 2);
        assert_eq!(log.statements()[1].params, vec![SqlValue::Int(3)]);
        log.reset();
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_default_describe_table_uses_show_columns() {
        let columns = Empty.describe_table("notes").expect("describe");
        assert_eq!(columns, vec![ColumnInfo::new("title", "varchar(300)")]);
        assert_eq!(Empty.escape_identifier("notes"), "`notes`");
    }
}
