//! Declarative table definitions and the schema manifest.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::MigrationConfig;
use crate::dialect::MigrationDialect;
use crate::error::{MigrateError, Result};
use crate::index::IndexColumn;

/// A table as declared by the application: column name to SQL definition,
/// in declaration order, plus the columns that should carry an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Column name to type definition, e.g. `"content" => "longtext NOT NULL"`.
    pub columns: IndexMap<String, String>,
    /// Columns to index after creation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,
}

impl TableDefinition {
    /// Creates a definition with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.columns.insert(name.into(), definition.into());
        self
    }

    /// Marks columns to be indexed.
    #[must_use]
    pub fn index<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Returns the declared definition of a column.
    #[must_use]
    pub fn definition(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Renders this table's `CREATE TABLE` statement.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::EmptyTable`] when no column is declared.
    pub fn create_sql(&self, dialect: &dyn MigrationDialect, config: &MigrationConfig) -> Result<String> {
        if self.columns.is_empty() {
            return Err(MigrateError::EmptyTable(self.name.clone()));
        }
        Ok(dialect.create_table_sql(&self.name, &self.columns, &config.charset_collate))
    }

    /// Plans the declared indexes from the declared column types.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::UnknownColumn`] for an index on an undeclared
    /// column.
    pub fn planned_indexes(&self) -> Result<Vec<IndexColumn>> {
        self.indexes
            .iter()
            .map(|column| {
                self.definition(column)
                    .map(|definition| IndexColumn::new(column.as_str(), definition))
                    .ok_or_else(|| MigrateError::UnknownColumn {
                        table: self.name.clone(),
                        column: column.clone(),
                    })
            })
            .collect()
    }
}

/// Every table an application owns, loadable from JSON.
///
/// ```
/// use margin_migrate::{MigrationConfig, MySqlDialect, SchemaManifest};
///
/// let manifest = SchemaManifest::from_json(r#"{
///     "tables": [{
///         "name": "tags",
///         "columns": {"id": "bigint(20) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY", "label": "varchar(300) NOT NULL"},
///         "indexes": ["label"]
///     }]
/// }"#).unwrap();
///
/// let sql = manifest.render(&MySqlDialect, &MigrationConfig::default()).unwrap();
/// assert_eq!(sql[1], "ALTER TABLE `tags` ADD INDEX `label` (`label`(191))");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaManifest {
    /// Tables in creation order.
    pub tables: Vec<TableDefinition>,
}

impl SchemaManifest {
    /// Creates a manifest from table definitions.
    #[must_use]
    pub fn new(tables: Vec<TableDefinition>) -> Self {
        Self { tables }
    }

    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Serialization`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Io`] when the file cannot be read and
    /// [`MigrateError::Serialization`] for malformed JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| MigrateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Serializes the manifest as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Renders the DDL for a fresh database without touching one: each
    /// `CREATE TABLE` followed by its index statements.
    ///
    /// # Errors
    ///
    /// Returns an error for tables without columns or indexes on undeclared
    /// columns.
    pub fn render(&self, dialect: &dyn MigrationDialect, config: &MigrationConfig) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for table in &self.tables {
            statements.push(table.create_sql(dialect, config)?);
            for index in table.planned_indexes()? {
                statements.push(dialect.add_index_sql(&table.name, &index));
            }
        }
        Ok(statements)
    }
}
