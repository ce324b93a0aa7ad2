//! Reconciling declared tables with the live schema.

use tracing::{debug, info};

use margin_sql_core::{Connection, SqlValue};

use crate::dialect::MigrationDialect;
use crate::error::Result;
use crate::schema::TableDefinition;

/// Brings the live schema in line with a `CREATE TABLE` statement.
///
/// Implementations must be idempotent: reconciling a table that already
/// matches runs no DDL. Nothing is ever dropped.
pub trait SchemaDiffer {
    /// Reconciles `table`, whose full statement is `create_sql`, and returns
    /// the DDL statements that were executed.
    ///
    /// # Errors
    ///
    /// Propagates introspection and DDL errors. Statements already executed
    /// are not rolled back.
    fn reconcile(
        &self,
        conn: &dyn Connection,
        dialect: &dyn MigrationDialect,
        table: &TableDefinition,
        create_sql: &str,
    ) -> Result<Vec<String>>;
}

/// Creates a missing table, or adds the declared columns an existing table
/// lacks. Column types and keys of existing columns are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnDiffer;

impl ColumnDiffer {
    fn table_exists(conn: &dyn Connection, dialect: &dyn MigrationDialect, table: &str) -> Result<bool> {
        let rows = conn.select(
            dialect.table_exists_sql(),
            &[SqlValue::Text(table.to_string())],
        )?;
        Ok(rows
            .first()
            .and_then(|row| row.get("n"))
            .and_then(SqlValue::as_i64)
            .unwrap_or(0)
            > 0)
    }
}

impl SchemaDiffer for ColumnDiffer {
    fn reconcile(
        &self,
        conn: &dyn Connection,
        dialect: &dyn MigrationDialect,
        table: &TableDefinition,
        create_sql: &str,
    ) -> Result<Vec<String>> {
        if !Self::table_exists(conn, dialect, &table.name)? {
            conn.execute(create_sql, &[])?;
            info!(table = %table.name, "Created table");
            return Ok(vec![create_sql.to_string()]);
        }

        let live = conn.describe_table(&table.name)?;
        let mut executed = Vec::new();
        for (column, definition) in &table.columns {
            if live.iter().any(|c| c.name.eq_ignore_ascii_case(column)) {
                continue;
            }
            let sql = dialect.add_column_sql(&table.name, column, definition);
            conn.execute(&sql, &[])?;
            info!(table = %table.name, column = %column, "Added column");
            executed.push(sql);
        }
        if executed.is_empty() {
            debug!(table = %table.name, "Table already up to date");
        }
        Ok(executed)
    }
}
