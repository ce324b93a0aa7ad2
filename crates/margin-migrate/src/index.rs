//! Index-length policy.
//!
//! InnoDB with `utf8mb4` can index at most 767 bytes of a column, which is
//! 191 four-byte characters. Any wider column gets an explicit prefix index
//! instead of letting the server reject or truncate the key.

use std::sync::LazyLock;

use regex::Regex;

use margin_sql_core::schema::ColumnInfo;

/// Longest key, in characters, indexed in full.
pub const MAX_INDEX_LENGTH: u32 = 191;

static SIZED_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:var)?(?:char|binary)\s*\(\s*(\d+)\s*\)").expect("valid sized type pattern")
});

static LONG_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:tiny|medium|long)?(?:text|blob)\b").expect("valid long type pattern")
});

/// Returns the prefix length a column of `column_type` must be indexed with,
/// or `None` when a full-column index fits.
///
/// ```
/// use margin_migrate::index::prefix_length;
///
/// assert_eq!(prefix_length("VARCHAR(300)"), Some(191));
/// assert_eq!(prefix_length("longtext"), Some(191));
/// assert_eq!(prefix_length("varchar(50)"), None);
/// assert_eq!(prefix_length("bigint(20) unsigned"), None);
/// ```
#[must_use]
pub fn prefix_length(column_type: &str) -> Option<u32> {
    if LONG_TYPE.is_match(column_type) {
        return Some(MAX_INDEX_LENGTH);
    }
    let width: u64 = SIZED_TYPE.captures(column_type)?.get(1)?.as_str().parse().ok()?;
    (width > u64::from(MAX_INDEX_LENGTH)).then_some(MAX_INDEX_LENGTH)
}

/// One column to index, with its prefix when the column is too wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Prefix length, `None` for a full-column index.
    pub prefix: Option<u32>,
}

impl IndexColumn {
    /// Plans the index for a column of the given declared type.
    pub fn new(name: impl Into<String>, column_type: &str) -> Self {
        Self {
            name: name.into(),
            prefix: prefix_length(column_type),
        }
    }

    /// Plans the index for an introspected column.
    #[must_use]
    pub fn for_column(info: &ColumnInfo) -> Self {
        Self::new(info.name.clone(), &info.column_type)
    }

    /// Returns whether only a prefix of the column is indexed.
    #[must_use]
    pub const fn is_prefix(&self) -> bool {
        self.prefix.is_some()
    }
}
