//! A blocking SQLite connection.
//!
//! sqlx is async-only, so the connection owns a current-thread tokio runtime
//! and blocks on each statement. Do not call it from inside another tokio
//! runtime.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Row as _, Sqlite, TypeInfo, ValueRef};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tracing::{debug, info};

use margin_sql_core::{ColumnInfo, Connection, Dialect, Result, Row, SqlError, SqlValue};

use crate::dialect::SqliteDialect;

type RawConnection = sqlx::SqliteConnection;
type RawQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A single SQLite connection usable through the synchronous
/// [`Connection`] trait.
pub struct SqliteConnection {
    runtime: Runtime,
    raw: Mutex<RawConnection>,
    last_insert_id: Mutex<Option<i64>>,
}

impl SqliteConnection {
    /// Opens (creating if needed) the database at `url`, e.g.
    /// `sqlite://notes.db` or `sqlite::memory:`.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the runtime cannot start or the database
    /// cannot be opened.
    pub fn open(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(SqlError::driver)?
            .create_if_missing(true);
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SqlError::driver)?;
        let raw = runtime
            .block_on(options.connect())
            .map_err(SqlError::driver)?;
        info!(url = %url, "opened sqlite database");
        Ok(Self {
            runtime,
            raw: Mutex::new(raw),
            last_insert_id: Mutex::new(None),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the runtime cannot start.
    pub fn open_in_memory() -> Result<Self> {
        Self::open("sqlite::memory:")
    }

    fn lock(&self) -> MutexGuard<'_, RawConnection> {
        self.raw.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connection for SqliteConnection {
    fn select(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        debug!(sql = %sql, params = params.len(), "sqlite select");
        let rows = self.runtime.block_on(async {
            let mut raw = self.lock();
            bind_all(sqlx::query(sql), params)
                .fetch_all(&mut *raw)
                .await
        });
        rows.map_err(SqlError::driver)?
            .iter()
            .map(decode_row)
            .collect()
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        debug!(sql = %sql, params = params.len(), "sqlite execute");
        let done = self
            .runtime
            .block_on(async {
                let mut raw = self.lock();
                bind_all(sqlx::query(sql), params).execute(&mut *raw).await
            })
            .map_err(SqlError::driver)?;
        if sql.trim_start().to_ascii_uppercase().starts_with("INSERT") {
            *self
                .last_insert_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(done.last_insert_rowid());
        }
        Ok(done.rows_affected())
    }

    fn last_insert_id(&self) -> Option<i64> {
        *self
            .last_insert_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    /// Reads `pragma_table_info`; primary key columns report `PRI` and
    /// columns covered by another index report `MUL`.
    fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let table_param = [SqlValue::Text(table.to_string())];
        let indexed: Vec<String> = self
            .select(
                "SELECT DISTINCT ii.name AS name FROM pragma_index_list(?) AS il, pragma_index_info(il.name) AS ii",
                &table_param,
            )?
            .iter()
            .filter_map(|row| row.get("name").and_then(SqlValue::as_str).map(str::to_string))
            .collect();
        let columns = self.select(
            "SELECT name, type, pk FROM pragma_table_info(?) ORDER BY cid",
            &table_param,
        )?;
        Ok(columns
            .iter()
            .filter_map(|row| {
                let name = row.get("name")?.as_str()?.to_string();
                let column_type = row
                    .get("type")
                    .and_then(SqlValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                let key = if row.get("pk").and_then(SqlValue::as_i64).unwrap_or(0) > 0 {
                    "PRI"
                } else if indexed.contains(&name) {
                    "MUL"
                } else {
                    ""
                };
                Some(ColumnInfo::new(name, column_type).with_key(key))
            })
            .collect())
    }
}

/// Binds every parameter in order.
fn bind_all<'q>(mut query: RawQuery<'q>, params: &[SqlValue]) -> RawQuery<'q> {
    for value in params {
        query = match value.clone() {
            SqlValue::Null => query.bind(Option::<i64>::None),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(s) => query.bind(s),
            SqlValue::Blob(b) => query.bind(b),
        };
    }
    query
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(SqlError::driver)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get(index).map_err(SqlError::driver)?),
                "REAL" => SqlValue::Float(row.try_get(index).map_err(SqlError::driver)?),
                "BLOB" => SqlValue::Blob(row.try_get(index).map_err(SqlError::driver)?),
                _ => SqlValue::Text(row.try_get(index).map_err(SqlError::driver)?),
            }
        };
        out.insert(column.name(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().expect("Failed to open in-memory SQLite");
        conn.execute(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, content TEXT NOT NULL, score REAL, is_resolved INTEGER NOT NULL DEFAULT 0)",
            &[],
        )
        .expect("create table");
        conn
    }

    #[test]
    fn test_insert_and_select_round_trip() {
        let conn = create_test_connection();
        conn.execute(
            "INSERT INTO notes (content, score, is_resolved) VALUES (?, ?, ?)",
            &[
                SqlValue::Text("first".into()),
                SqlValue::Float(1.5),
                SqlValue::Bool(true),
            ],
        )
        .expect("insert");
        assert_eq!(conn.last_insert_id(), Some(1));

        let rows = conn
            .select("SELECT id, content, score, is_resolved FROM notes", &[])
            .expect("select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value("id"), SqlValue::Int(1));
        assert_eq!(rows[0].value("content"), SqlValue::Text("first".into()));
        assert_eq!(rows[0].value("score"), SqlValue::Float(1.5));
        assert_eq!(rows[0].value("is_resolved"), SqlValue::Int(1));
    }

    #[test]
    fn test_null_and_expression_columns() {
        let conn = create_test_connection();
        conn.execute(
            "INSERT INTO notes (content, score) VALUES (?, ?)",
            &[SqlValue::Text("x".into()), SqlValue::Null],
        )
        .expect("insert");
        let rows = conn
            .select("SELECT score, COUNT(*) AS total FROM notes", &[])
            .expect("select");
        assert_eq!(rows[0].value("score"), SqlValue::Null);
        assert_eq!(rows[0].value("total"), SqlValue::Int(1));
    }

    #[test]
    fn test_describe_table_reports_keys() {
        let conn = create_test_connection();
        conn.execute("CREATE INDEX notes_content ON notes (content)", &[])
            .expect("index");
        let columns = conn.describe_table("notes").expect("describe");
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].key, "PRI");
        assert_eq!(columns[1], ColumnInfo::new("content", "TEXT").with_key("MUL"));
        assert!(!columns[2].is_indexed());
        assert!(conn.describe_table("missing").expect("describe").is_empty());
    }

    #[test]
    fn test_driver_errors_propagate() {
        let conn = create_test_connection();
        let err = conn.select("SELECT * FROM nope", &[]).unwrap_err();
        assert!(matches!(err, SqlError::Driver(_)));
    }
}
