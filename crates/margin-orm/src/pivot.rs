//! Typed pivot tables and their write operations.
//!
//! A pivot row links a parent to a related key under a relation `type`. Its
//! rows are only created and destroyed through [`PivotTable`]; the three
//! statements of a sync run in sequence without a transaction.

use chrono::Utc;
use tracing::debug;

use margin_sql_core::{Builder, Collection, Connection, QueryBuilder, Row, SqlValue, DATETIME_FORMAT};

use crate::error::Result;
use crate::model::Model;

/// A model stored in a typed pivot table.
pub trait Pivot: Model {
    /// Column holding the parent key.
    const PARENT_COLUMN: &'static str;

    /// Column holding the related key.
    const RELATED_COLUMN: &'static str;

    /// Column holding the relation kind.
    const TYPE_COLUMN: &'static str = "type";

    /// Creation timestamp column, if the table has one.
    const CREATED_AT: Option<&'static str> = Some("created_at");

    /// Update timestamp column, if the table has one.
    const UPDATED_AT: Option<&'static str> = Some("updated_at");

    /// The parent key of this row.
    fn parent_key(&self) -> i64;

    /// The related key of this row.
    fn related_key(&self) -> i64;
}

/// The pivot rows of one parent and one relation kind.
pub struct PivotTable<'c, Pv: Pivot> {
    conn: &'c dyn Connection,
    parent: i64,
    kind: String,
    _pivot: std::marker::PhantomData<Pv>,
}

impl<'c, Pv: Pivot> PivotTable<'c, Pv> {
    /// Addresses the `kind` rows of `parent`.
    #[must_use]
    pub fn new(conn: &'c dyn Connection, parent: i64, kind: &str) -> Self {
        Self {
            conn,
            parent,
            kind: kind.to_string(),
            _pivot: std::marker::PhantomData,
        }
    }

    /// Returns the related keys currently linked.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn keys(&self) -> Result<Collection<i64>> {
        let rows = self.scoped().select(&[Pv::RELATED_COLUMN]).get()?;
        Ok(rows
            .iter()
            .filter_map(|row| row.first_value().and_then(SqlValue::as_i64))
            .collect())
    }

    /// Makes the linked keys exactly `targets`.
    ///
    /// Issues one SELECT of the current keys, one DELETE of the stale keys
    /// and one INSERT of the new keys; steps with nothing to do are skipped.
    /// Returns only the newly inserted keys.
    ///
    /// # Errors
    ///
    /// Propagates driver errors. A failure after the DELETE leaves the stale
    /// keys removed.
    pub fn sync(&self, targets: impl IntoIterator<Item = i64>) -> Result<Collection<i64>> {
        let targets: Collection<i64> = targets.into_iter().collect::<Collection<_>>().unique();
        let existing = self.keys()?;
        let stale = existing.clone().diff(&targets);
        let fresh = targets.diff(&existing);

        if !stale.is_empty() {
            self.scoped()
                .where_in(Pv::RELATED_COLUMN, stale.iter().copied())
                .delete()?;
        }
        self.insert_keys(&fresh)?;
        debug!(table = Pv::TABLE, parent = self.parent, kind = %self.kind, removed = stale.len(), added = fresh.len(), "sync");
        Ok(fresh)
    }

    /// Links `keys` that are not linked yet and returns them.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn attach(&self, keys: impl IntoIterator<Item = i64>) -> Result<Collection<i64>> {
        let keys: Collection<i64> = keys.into_iter().collect::<Collection<_>>().unique();
        if keys.is_empty() {
            return Ok(keys);
        }
        let fresh = keys.diff(&self.keys()?);
        self.insert_keys(&fresh)?;
        Ok(fresh)
    }

    /// Unlinks `keys` and returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn detach(&self, keys: impl IntoIterator<Item = i64>) -> Result<u64> {
        let keys: Vec<i64> = keys.into_iter().collect();
        if keys.is_empty() {
            return Ok(0);
        }
        Ok(self.scoped().where_in(Pv::RELATED_COLUMN, keys).delete()?)
    }

    fn scoped(&self) -> QueryBuilder<'c> {
        QueryBuilder::table(self.conn, Pv::TABLE)
            .where_eq(Pv::PARENT_COLUMN, self.parent)
            .where_eq(Pv::TYPE_COLUMN, self.kind.as_str())
    }

    fn insert_keys(&self, keys: &Collection<i64>) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let now = Utc::now().format(DATETIME_FORMAT).to_string();
        let rows: Vec<Row> = keys
            .iter()
            .map(|key| {
                let mut row = Row::new()
                    .with(Pv::PARENT_COLUMN, self.parent)
                    .with(Pv::RELATED_COLUMN, *key)
                    .with(Pv::TYPE_COLUMN, self.kind.as_str());
                for column in [Pv::CREATED_AT, Pv::UPDATED_AT].into_iter().flatten() {
                    row.insert(column, now.as_str());
                }
                row
            })
            .collect();
        Ok(QueryBuilder::table(self.conn, Pv::TABLE).insert_many(&rows)?)
    }
}
