#![allow(dead_code)]

use margin_sql_core::{Connection, QueryLog, Result, Row, SqlValue};

/// A connection that answers every SELECT with the same rows.
pub struct Canned {
    pub rows: Vec<Row>,
}

impl Connection for Canned {
    fn select(&self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }

    fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<u64> {
        Ok(0)
    }

    fn last_insert_id(&self) -> Option<i64> {
        None
    }
}

pub fn logged(rows: Vec<Row>) -> QueryLog<Canned> {
    QueryLog::new(Canned { rows })
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}
