//! Database dialect implementations.
//!
//! Each dialect knows how to render the DDL the migrator emits for its
//! database system.

mod mysql;
mod sqlite;

pub use mysql::MySqlDialect;
pub use sqlite::SqliteDialect;

use indexmap::IndexMap;

use crate::index::IndexColumn;

/// Trait for database-specific DDL generation.
pub trait MigrationDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Quotes an identifier (table name, column name, index name).
    fn quote_identifier(&self, name: &str) -> String;

    /// Returns whether `CREATE TABLE` accepts trailing table options such as
    /// a charset and collation.
    fn supports_table_options(&self) -> bool;

    /// Query counting tables named by its single parameter, aliased `n`.
    fn table_exists_sql(&self) -> &'static str;

    /// Renders the `ADD INDEX` statement for one column.
    fn add_index_sql(&self, table: &str, index: &IndexColumn) -> String;

    /// Adapts a declared column definition to this dialect.
    fn column_definition(&self, definition: &str) -> String {
        definition.trim().to_string()
    }

    /// Generates SQL for creating a table.
    fn create_table_sql(
        &self,
        table: &str,
        columns: &IndexMap<String, String>,
        charset_collate: &str,
    ) -> String {
        let definitions: Vec<String> = columns
            .iter()
            .map(|(name, definition)| {
                format!(
                    "{} {}",
                    self.quote_identifier(name),
                    self.column_definition(definition)
                )
            })
            .collect();
        let mut sql = format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.quote_identifier(table),
            definitions.join(",\n  ")
        );
        if self.supports_table_options() && !charset_collate.is_empty() {
            sql.push(' ');
            sql.push_str(charset_collate);
        }
        sql
    }

    /// Generates SQL for adding a column to an existing table.
    fn add_column_sql(&self, table: &str, column: &str, definition: &str) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.quote_identifier(table),
            self.quote_identifier(column),
            self.column_definition(definition)
        )
    }

    /// Generates SQL for dropping a table.
    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table))
    }
}
