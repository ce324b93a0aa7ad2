//! Declarative schema migrations for `margin-sql-core` connections.
//!
//! `margin-migrate` turns table declarations into DDL:
//! - `create_table` renders a `CREATE TABLE` with the configured charset and
//!   hands it to a [`SchemaDiffer`], so re-running is a no-op
//! - `create_indexes` introspects the live columns and uses a prefix index
//!   for any column too wide for a full `utf8mb4` key
//! - `drop_table` drops unconditionally with `IF EXISTS`
//!
//! SQL generation is dialect-aware (MySQL, SQLite).
//!
//! # Example
//!
//! ```rust
//! use margin_migrate::{Migrator, SqliteDialect};
//! use margin_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_in_memory().unwrap();
//! let migrator = Migrator::new(&conn, SqliteDialect);
//!
//! let created = migrator
//!     .create_table("tags", [
//!         ("id", "bigint(20) unsigned NOT NULL AUTO_INCREMENT PRIMARY KEY"),
//!         ("label", "varchar(300) NOT NULL"),
//!     ])
//!     .unwrap();
//! assert_eq!(created.len(), 1);
//!
//! // Already matching: nothing to run.
//! assert!(migrator.create_table("tags", [("label", "varchar(300) NOT NULL")]).unwrap().is_empty());
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the MySQL DDL for a manifest
//! margin-migrate sql schema.json
//!
//! # Apply a manifest to a SQLite database
//! margin-migrate --database sqlite://notes.db apply schema.json
//!
//! # Drop a table
//! margin-migrate --database sqlite://notes.db drop notes_users
//! ```

pub mod config;
pub mod dialect;
pub mod differ;
pub mod error;
pub mod index;
pub mod migrator;
pub mod schema;

pub use config::{MigrationConfig, DEFAULT_CHARSET_COLLATE};
pub use dialect::{MigrationDialect, MySqlDialect, SqliteDialect};
pub use differ::{ColumnDiffer, SchemaDiffer};
pub use error::{MigrateError, Result};
pub use index::{IndexColumn, MAX_INDEX_LENGTH};
pub use migrator::Migrator;
pub use schema::{SchemaManifest, TableDefinition};
