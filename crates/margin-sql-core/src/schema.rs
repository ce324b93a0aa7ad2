//! Live column metadata as reported by the database.

use serde::{Deserialize, Serialize};

use crate::row::Row;

/// One column of an existing table, as returned by `SHOW COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name (`Field`).
    pub name: String,
    /// Declared type, e.g. `varchar(255)` or `longtext` (`Type`).
    pub column_type: String,
    /// Key membership (`Key`): empty, `PRI`, `UNI` or `MUL`.
    pub key: String,
}

impl ColumnInfo {
    /// Creates column metadata with no key.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            key: String::new(),
        }
    }

    /// Sets the key membership.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Returns whether the column already takes part in an index.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.key.trim().is_empty()
    }

    /// Reads a `SHOW COLUMNS` row (`Field`, `Type`, `Key`).
    #[must_use]
    pub fn from_show_columns(row: &Row) -> Option<Self> {
        let name = row.get("Field")?.as_str()?.to_string();
        let column_type = row
            .get("Type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let key = row
            .get("Key")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Some(Self {
            name,
            column_type,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_show_columns() {
        let row = Row::new()
            .with("Field", "content")
            .with("Type", "longtext")
            .with("Null", "NO")
            .with("Key", "");
        let info = ColumnInfo::from_show_columns(&row).expect("has Field");
        assert_eq!(info, ColumnInfo::new("content", "longtext"));
        assert!(!info.is_indexed());
        assert!(ColumnInfo::new("id", "bigint").with_key("PRI").is_indexed());
    }
}
