//! margin-migrate CLI
//!
//! Command-line tool for rendering and applying schema manifests.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use margin_migrate::{MigrationConfig, MigrationDialect, Migrator, MySqlDialect, SchemaManifest, SqliteDialect};
use margin_sqlite::SqliteConnection;

/// Declarative schema migrations.
#[derive(Parser)]
#[command(name = "margin-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite://margin.sqlite3")]
    database: String,

    /// Charset and collation clause appended to CREATE TABLE.
    #[arg(long, env = "MARGIN_CHARSET_COLLATE")]
    charset_collate: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the DDL for a manifest without touching a database.
    Sql {
        /// Path to the JSON schema manifest.
        manifest: PathBuf,

        /// Dialect to render.
        #[arg(long, value_enum, default_value_t = DialectArg::Mysql)]
        dialect: DialectArg,
    },

    /// Create missing tables, columns and indexes in the SQLite database.
    Apply {
        /// Path to the JSON schema manifest.
        manifest: PathBuf,
    },

    /// Drop a table if it exists.
    Drop {
        /// Table name.
        table: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Mysql,
    Sqlite,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match cli.charset_collate {
        Some(clause) => MigrationConfig::default().with_charset_collate(clause),
        None => MigrationConfig::default(),
    };

    match cli.command {
        Commands::Sql { manifest, dialect } => {
            let manifest = SchemaManifest::from_path(&manifest)?;
            let dialect: &dyn MigrationDialect = match dialect {
                DialectArg::Mysql => &MySqlDialect,
                DialectArg::Sqlite => &SqliteDialect,
            };
            for statement in manifest.render(dialect, &config)? {
                println!("{statement};\n");
            }
        }

        Commands::Apply { manifest } => {
            let manifest = SchemaManifest::from_path(&manifest)?;
            let conn = SqliteConnection::open(&cli.database)?;
            let migrator = Migrator::new(&conn, SqliteDialect).with_config(config);
            let executed = migrator.apply(&manifest)?;
            if executed.is_empty() {
                info!("Schema already up to date.");
            }
        }

        Commands::Drop { table } => {
            let conn = SqliteConnection::open(&cli.database)?;
            Migrator::new(&conn, SqliteDialect).drop_table(&table)?;
        }
    }

    Ok(())
}
