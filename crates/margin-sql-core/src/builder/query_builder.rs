//! A query bound to a connection, with terminal operations that run it.

use tracing::debug;

use super::fluent::Builder;
use super::query::Query;
use crate::collection::Collection;
use crate::connection::Connection;
use crate::error::Result;
use crate::row::Row;
use crate::value::SqlValue;

/// Builds a query and runs it on a borrowed connection.
///
/// Each logical query gets its own builder; builders are never shared.
pub struct QueryBuilder<'c> {
    conn: &'c dyn Connection,
    query: Query,
}

impl<'c> QueryBuilder<'c> {
    /// Creates a builder with no table.
    #[must_use]
    pub fn new(conn: &'c dyn Connection) -> Self {
        Self::from_query(conn, Query::new())
    }

    /// Creates a builder selecting from `table`.
    #[must_use]
    pub fn table(conn: &'c dyn Connection, table: &str) -> Self {
        Self::new(conn).from(table)
    }

    /// Binds an already-built query to a connection.
    #[must_use]
    pub fn from_query(conn: &'c dyn Connection, query: Query) -> Self {
        Self { conn, query }
    }

    /// Returns the connection this builder runs on.
    #[must_use]
    pub fn connection(&self) -> &'c dyn Connection {
        self.conn
    }

    /// Gives up the connection and returns the query state.
    #[must_use]
    pub fn into_query(self) -> Query {
        self.query
    }

    /// Compiles the SELECT statement with the connection's dialect.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        self.query.to_sql_with(self.conn.dialect())
    }

    /// Runs the query and returns every row.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn get(&self) -> Result<Collection<Row>> {
        let (sql, params) = self.to_sql();
        debug!(sql = %sql, "select");
        Ok(self.conn.select(&sql, &params)?.into())
    }

    /// Runs the query with `LIMIT 1`. A missing row is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn first(&self) -> Result<Option<Row>> {
        let mut query = self.query.clone();
        query.limit = Some(1);
        let (sql, params) = query.to_sql_with(self.conn.dialect());
        debug!(sql = %sql, "select first");
        Ok(self.conn.select(&sql, &params)?.into_iter().next())
    }

    /// Counts the rows the query matches.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn count(&self) -> Result<i64> {
        let (sql, params) = self.query.count_sql_with(self.conn.dialect());
        debug!(sql = %sql, "count");
        let rows = self.conn.select(&sql, &params)?;
        Ok(rows
            .first()
            .and_then(Row::first_value)
            .and_then(SqlValue::as_i64)
            .unwrap_or(0))
    }

    /// Inserts one row and returns the generated id, if the driver reports one.
    ///
    /// # Errors
    ///
    /// Returns an error if no table is set or `fields` is empty, and
    /// propagates driver errors.
    pub fn insert(&self, fields: Row) -> Result<Option<i64>> {
        let (sql, params) = self
            .query
            .insert_sql_with(self.conn.dialect(), std::slice::from_ref(&fields))?;
        debug!(sql = %sql, "insert");
        self.conn.execute(&sql, &params)?;
        Ok(self.conn.last_insert_id())
    }

    /// Inserts several rows in one statement. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows do not share one column list, and
    /// propagates driver errors.
    pub fn insert_many(&self, rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let (sql, params) = self.query.insert_sql_with(self.conn.dialect(), rows)?;
        debug!(sql = %sql, rows = rows.len(), "insert many");
        self.conn.execute(&sql, &params)
    }

    /// Updates the matched rows and returns the affected count.
    ///
    /// # Errors
    ///
    /// Fails before sending anything when no WHERE clause was added.
    /// Propagates driver errors.
    pub fn update(&self, fields: Row) -> Result<u64> {
        let (sql, params) = self.query.update_sql_with(self.conn.dialect(), &fields)?;
        debug!(sql = %sql, "update");
        self.conn.execute(&sql, &params)
    }

    /// Deletes the matched rows and returns the affected count.
    ///
    /// # Errors
    ///
    /// Fails before sending anything when no WHERE clause was added.
    /// Propagates driver errors.
    pub fn delete(&self) -> Result<u64> {
        let (sql, params) = self.query.delete_sql_with(self.conn.dialect())?;
        debug!(sql = %sql, "delete");
        self.conn.execute(&sql, &params)
    }
}

impl Builder for QueryBuilder<'_> {
    fn query(&self) -> &Query {
        &self.query
    }

    fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::QueryLog;
    use crate::error::SqlError;

    struct Scripted {
        rows: Vec<Row>,
    }

    impl Connection for Scripted {
        fn select(&self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>> {
            Ok(self.rows.clone())
        }

        fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<u64> {
            Ok(1)
        }

        fn last_insert_id(&self) -> Option<i64> {
            Some(42)
        }
    }

    fn log() -> QueryLog<Scripted> {
        QueryLog::new(Scripted {
            rows: vec![Row::new().with("aggregate", 3)],
        })
    }

    #[test]
    fn test_unconstrained_update_sends_nothing() {
        let log = log();
        let err = QueryBuilder::table(&log, "notes")
            .update(Row::new().with("is_resolved", true))
            .unwrap_err();
        assert!(matches!(err, SqlError::UnconstrainedMutation { .. }));
        let err = QueryBuilder::table(&log, "notes").delete().unwrap_err();
        assert!(matches!(err, SqlError::UnconstrainedMutation { .. }));
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_empty_where_groups_do_not_constrain_mutations() {
        let log = log();
        let err = QueryBuilder::table(&log, "notes")
            .where_group(|q| q.when(false, |q| q.where_eq("user_id", 1)))
            .update(Row::new().with("content", "x"))
            .unwrap_err();
        assert!(matches!(err, SqlError::UnconstrainedMutation { .. }));
        let err = QueryBuilder::table(&log, "notes")
            .where_group(|q| q)
            .or_where_group(|q| q.where_group(|q| q))
            .delete()
            .unwrap_err();
        assert!(matches!(err, SqlError::UnconstrainedMutation { .. }));
        let err = QueryBuilder::table(&log, "notes")
            .soft_deletes("trashed_at")
            .only_trashed()
            .delete()
            .unwrap_err();
        assert!(matches!(err, SqlError::UnconstrainedMutation { .. }));
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_non_empty_group_constrains_mutation() {
        let log = log();
        QueryBuilder::table(&log, "notes")
            .where_group(|q| q.when(true, |q| q.where_eq("user_id", 1)))
            .update(Row::new().with("content", "x"))
            .expect("update");
        assert_eq!(
            log.statements()[0].sql,
            "UPDATE `notes` SET `content` = ? WHERE (`user_id` = ?)"
        );
    }

    #[test]
    fn test_insert_returns_last_id() {
        let log = log();
        let id = QueryBuilder::table(&log, "notes")
            .insert(Row::new().with("content", "hi").with("author_id", 1))
            .expect("insert");
        assert_eq!(id, Some(42));
        assert_eq!(
            log.statements()[0].sql,
            "INSERT INTO `notes` (`content`, `author_id`) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_count_reads_aggregate() {
        let log = log();
        let n = QueryBuilder::table(&log, "notes")
            .where_eq("document_id", 1)
            .order_by("id")
            .count()
            .expect("count");
        assert_eq!(n, 3);
        assert_eq!(
            log.statements()[0].sql,
            "SELECT COUNT(*) AS `aggregate` FROM `notes` WHERE `document_id` = ?"
        );
    }

    #[test]
    fn test_first_limits_to_one() {
        let log = log();
        let row = QueryBuilder::table(&log, "notes").first().expect("first");
        assert!(row.is_some());
        assert_eq!(log.statements()[0].sql, "SELECT * FROM `notes` LIMIT 1");
    }

    #[test]
    fn test_insert_many_single_statement() {
        let log = log();
        let rows = vec![
            Row::new().with("note_id", 1).with("user_id", 2),
            Row::new().with("note_id", 1).with("user_id", 3),
        ];
        QueryBuilder::table(&log, "notes_users")
            .insert_many(&rows)
            .expect("insert");
        assert_eq!(log.count(), 1);
        assert_eq!(
            log.statements()[0].sql,
            "INSERT INTO `notes_users` (`note_id`, `user_id`) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(log.statements()[0].params.len(), 4);
    }
}
