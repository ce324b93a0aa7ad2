//! MySQL dialect for migrations.

use crate::index::IndexColumn;

use super::MigrationDialect;

/// MySQL migration dialect. Indexes are added with `ALTER TABLE` and named
/// after their column; wide columns get a prefix index.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MigrationDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn supports_table_options(&self) -> bool {
        true
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT COUNT(*) AS n FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?"
    }

    fn add_index_sql(&self, table: &str, index: &IndexColumn) -> String {
        let column = self.quote_identifier(&index.name);
        let key = match index.prefix {
            Some(length) => format!("{column}({length})"),
            None => column.clone(),
        };
        format!(
            "ALTER TABLE {} ADD INDEX {column} ({key})",
            self.quote_identifier(table)
        )
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn test_create_table_appends_charset() {
        let mut columns = IndexMap::new();
        columns.insert("id".to_string(), "bigint(20) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string());
        columns.insert("title".to_string(), " varchar(300) NOT NULL ".to_string());
        let sql = MySqlDialect.create_table_sql("docs", &columns, "DEFAULT CHARSET=utf8mb4");
        assert_eq!(
            sql,
            "CREATE TABLE `docs` (\n  `id` bigint(20) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY,\n  `title` varchar(300) NOT NULL\n) DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn test_prefix_and_full_indexes() {
        let sql = MySqlDialect.add_index_sql("notes", &IndexColumn::new("content", "TEXT"));
        assert_eq!(sql, "ALTER TABLE `notes` ADD INDEX `content` (`content`(191))");

        let sql = MySqlDialect.add_index_sql("notes", &IndexColumn::new("type", "VARCHAR(50)"));
        assert_eq!(sql, "ALTER TABLE `notes` ADD INDEX `type` (`type`)");
    }

    #[test]
    fn test_add_and_drop() {
        assert_eq!(
            MySqlDialect.add_column_sql("notes", "is_resolved", "tinyint(1) NOT NULL DEFAULT 0"),
            "ALTER TABLE `notes` ADD COLUMN `is_resolved` tinyint(1) NOT NULL DEFAULT 0"
        );
        assert_eq!(MySqlDialect.drop_table_sql("notes"), "DROP TABLE IF EXISTS `notes`");
    }
}
