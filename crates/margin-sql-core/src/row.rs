//! Raw result rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::{SqlValue, ToSqlValue};

/// One result row: column name to value, in SELECT order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: IndexMap<String, SqlValue>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, replacing any earlier value under the same name.
    pub fn insert(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        self.columns.insert(column.into(), value.to_sql_value());
    }

    /// Builder-style variant of [`Row::insert`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.insert(column, value);
        self
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    /// Returns the value of a column, or NULL when absent.
    #[must_use]
    pub fn value(&self, column: &str) -> SqlValue {
        self.get(column).cloned().unwrap_or(SqlValue::Null)
    }

    /// Returns the first column's value (aggregate results).
    #[must_use]
    pub fn first_value(&self) -> Option<&SqlValue> {
        self.columns.get_index(0).map(|(_, v)| v)
    }

    /// Returns whether the row has a column with this name.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: ToSqlValue> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, SqlValue);
    type IntoIter = indexmap::map::IntoIter<String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
