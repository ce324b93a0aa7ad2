//! SQLite dialect for migrations.
//!
//! SQLite has no prefix indexes and no table options, and only an
//! `INTEGER PRIMARY KEY` column aliases the rowid. MySQL column definitions
//! are translated accordingly so one manifest serves both databases.

use std::sync::LazyLock;

use regex::Regex;

use crate::index::IndexColumn;

use super::MigrationDialect;

static AUTO_INCREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bauto_?increment\b").expect("valid auto increment pattern"));

static UNSIGNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+unsigned\b").expect("valid unsigned pattern"));

/// SQLite migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl MigrationDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn supports_table_options(&self) -> bool {
        false
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?"
    }

    fn add_index_sql(&self, table: &str, index: &IndexColumn) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            self.quote_identifier(&format!("{table}_{}_index", index.name)),
            self.quote_identifier(table),
            self.quote_identifier(&index.name)
        )
    }

    fn column_definition(&self, definition: &str) -> String {
        if AUTO_INCREMENT.is_match(definition) {
            return "INTEGER PRIMARY KEY AUTOINCREMENT".to_string();
        }
        UNSIGNED.replace_all(definition.trim(), "").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_increment_becomes_rowid_alias() {
        assert_eq!(
            SqliteDialect.column_definition("bigint(20) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY"),
            "INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn test_unsigned_is_dropped() {
        assert_eq!(
            SqliteDialect.column_definition("bigint(20) unsigned NOT NULL DEFAULT 0"),
            "bigint(20) NOT NULL DEFAULT 0"
        );
        assert_eq!(SqliteDialect.column_definition("longtext NOT NULL"), "longtext NOT NULL");
    }

    #[test]
    fn test_index_never_has_prefix() {
        let sql = SqliteDialect.add_index_sql("notes", &IndexColumn::new("content", "longtext"));
        assert_eq!(
            sql,
            r#"CREATE INDEX IF NOT EXISTS "notes_content_index" ON "notes" ("content")"#
        );
    }

    #[test]
    fn test_no_table_options() {
        let mut columns = indexmap::IndexMap::new();
        columns.insert("id".to_string(), "int".to_string());
        let sql = SqliteDialect.create_table_sql("t", &columns, "DEFAULT CHARSET=utf8mb4");
        assert_eq!(sql, "CREATE TABLE \"t\" (\n  \"id\" int\n)");
    }
}
