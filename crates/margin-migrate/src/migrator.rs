//! The migration helper.

use tracing::{debug, info, warn};

use margin_sql_core::Connection;

use crate::config::MigrationConfig;
use crate::dialect::MigrationDialect;
use crate::differ::{ColumnDiffer, SchemaDiffer};
use crate::error::{MigrateError, Result};
use crate::index::IndexColumn;
use crate::schema::{SchemaManifest, TableDefinition};

/// Applies declarative schema changes through an injected connection.
///
/// DDL is not transactional; a failure part way leaves earlier statements
/// applied.
pub struct Migrator<'c> {
    conn: &'c dyn Connection,
    dialect: Box<dyn MigrationDialect>,
    differ: Box<dyn SchemaDiffer>,
    config: MigrationConfig,
}

impl<'c> Migrator<'c> {
    /// Creates a migrator using [`ColumnDiffer`] and the default config.
    pub fn new(conn: &'c dyn Connection, dialect: impl MigrationDialect + 'static) -> Self {
        Self {
            conn,
            dialect: Box::new(dialect),
            differ: Box::new(ColumnDiffer),
            config: MigrationConfig::default(),
        }
    }

    /// Replaces the schema differ.
    #[must_use]
    pub fn with_differ(mut self, differ: impl SchemaDiffer + 'static) -> Self {
        self.differ = Box::new(differ);
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Renders `CREATE TABLE` for `columns` and hands it to the differ.
    /// Returns the statements that were executed; empty when the table
    /// already matches.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::EmptyTable`] for an empty column list and
    /// propagates database errors.
    pub fn create_table<I, K, V>(&self, name: &str, columns: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table = columns
            .into_iter()
            .fold(TableDefinition::new(name), |t, (k, v)| t.column(k, v));
        self.create_definition(&table)
    }

    /// [`create_table`](Self::create_table) for a prepared definition. Its
    /// declared indexes are not created.
    ///
    /// # Errors
    ///
    /// See [`create_table`](Self::create_table).
    pub fn create_definition(&self, table: &TableDefinition) -> Result<Vec<String>> {
        let sql = table.create_sql(self.dialect.as_ref(), &self.config)?;
        debug!(sql = %sql, "Reconciling table");
        self.differ
            .reconcile(self.conn, self.dialect.as_ref(), table, &sql)
    }

    /// Indexes `columns` of the live table `name`.
    ///
    /// Column types come from `describe_table`. Columns wider than
    /// [`MAX_INDEX_LENGTH`](crate::index::MAX_INDEX_LENGTH) get a prefix
    /// index. Columns that already carry a key are skipped, so running this
    /// twice is a no-op. Returns the executed statements.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::UnknownColumn`] before running any DDL if a
    /// column does not exist, and propagates database errors.
    pub fn create_indexes(&self, name: &str, columns: &[&str]) -> Result<Vec<String>> {
        let live = self.conn.describe_table(name)?;
        let mut plans = Vec::new();
        for column in columns {
            let info = live
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(column))
                .ok_or_else(|| MigrateError::UnknownColumn {
                    table: name.to_string(),
                    column: (*column).to_string(),
                })?;
            if info.is_indexed() {
                warn!(table = %name, column = %info.name, key = %info.key, "Column already indexed, skipping");
                continue;
            }
            plans.push(IndexColumn::for_column(info));
        }

        let mut executed = Vec::with_capacity(plans.len());
        for plan in &plans {
            let sql = self.dialect.add_index_sql(name, plan);
            self.conn.execute(&sql, &[])?;
            info!(table = %name, column = %plan.name, prefix = ?plan.prefix, "Added index");
            executed.push(sql);
        }
        Ok(executed)
    }

    /// Drops `name` if it exists.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub fn drop_table(&self, name: &str) -> Result<String> {
        let sql = self.dialect.drop_table_sql(name);
        self.conn.execute(&sql, &[])?;
        info!(table = %name, "Dropped table");
        Ok(sql)
    }

    /// Reconciles every table of `manifest` and then creates its indexes.
    ///
    /// # Errors
    ///
    /// Stops at the first failing table.
    pub fn apply(&self, manifest: &SchemaManifest) -> Result<Vec<String>> {
        let mut executed = Vec::new();
        for table in &manifest.tables {
            executed.extend(self.create_definition(table)?);
            let indexes: Vec<&str> = table.indexes.iter().map(String::as_str).collect();
            executed.extend(self.create_indexes(&table.name, &indexes)?);
        }
        info!(dialect = self.dialect.name(), statements = executed.len(), "Schema applied");
        Ok(executed)
    }
}

impl std::fmt::Debug for Migrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
