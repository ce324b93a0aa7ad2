//! Attribute casts applied when a row is hydrated into a model.
//!
//! Rows arrive as loosely typed [`SqlValue`]s: MySQL returns most columns as
//! text, SQLite returns integers for booleans. A model declares how each
//! non-text field is to be read and [`Attributes`] applies that declaration.
//! Missing fields hydrate to the zero value of their cast.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;

use margin_sql_core::{Collection, Row, SqlValue, DATETIME_FORMAT};

use crate::error::{OrmError, Result};

/// MySQL's zero date, stored by legacy rows for "never".
const ZERO_DATETIME: &str = "0000-00-00 00:00:00";

/// How a field is coerced during hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    /// Signed 64-bit integer; missing is 0.
    Integer,
    /// Boolean from 0/1, "0"/"1" or "true"/"false"; missing is false.
    Boolean,
    /// UTC wall-clock timestamp; missing, NULL and the zero date are `None`.
    Timestamp,
    /// JSON array decoded into a collection; missing and NULL are empty.
    Collection,
}

/// A row viewed through a model's cast declaration.
#[derive(Debug, Clone, Copy)]
pub struct Attributes<'r> {
    row: &'r Row,
    casts: &'static [(&'static str, Cast)],
}

impl<'r> Attributes<'r> {
    /// Wraps a row with the given casts.
    #[must_use]
    pub const fn new(row: &'r Row, casts: &'static [(&'static str, Cast)]) -> Self {
        Self { row, casts }
    }

    /// Returns the declared cast for `field`.
    #[must_use]
    pub fn declared(&self, field: &str) -> Option<Cast> {
        self.casts
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, cast)| *cast)
    }

    /// Returns the raw value, NULL when the row lacks the column.
    #[must_use]
    pub fn raw(&self, field: &str) -> SqlValue {
        self.row.value(field)
    }

    /// Reads an integer field.
    ///
    /// # Errors
    ///
    /// Fails on text that is not a number.
    pub fn integer(&self, field: &str) -> Result<i64> {
        self.check(field, Cast::Integer)?;
        match self.raw(field) {
            SqlValue::Null => Ok(0),
            SqlValue::Text(s) if s.trim().is_empty() => Ok(0),
            SqlValue::Blob(_) => Err(OrmError::cast(field, "blob is not an integer")),
            other => other
                .as_i64()
                .ok_or_else(|| OrmError::cast(field, format!("`{other}` is not an integer"))),
        }
    }

    /// Reads a boolean field.
    ///
    /// # Errors
    ///
    /// Fails on text other than the accepted spellings.
    pub fn boolean(&self, field: &str) -> Result<bool> {
        self.check(field, Cast::Boolean)?;
        match self.raw(field) {
            SqlValue::Null => Ok(false),
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(n) => Ok(n != 0),
            SqlValue::Float(f) => Ok(f != 0.0),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                other => Err(OrmError::cast(field, format!("`{other}` is not a boolean"))),
            },
            SqlValue::Blob(_) => Err(OrmError::cast(field, "blob is not a boolean")),
        }
    }

    /// Reads a timestamp as stored, interpreting it as UTC.
    ///
    /// Integers are unix timestamps.
    ///
    /// # Errors
    ///
    /// Fails on text in an unknown format.
    pub fn timestamp(&self, field: &str) -> Result<Option<DateTime<Utc>>> {
        self.check(field, Cast::Timestamp)?;
        match self.raw(field) {
            SqlValue::Null => Ok(None),
            SqlValue::Int(secs) => DateTime::from_timestamp(secs, 0)
                .map(Some)
                .ok_or_else(|| OrmError::cast(field, format!("{secs} is out of range"))),
            SqlValue::Text(s) => parse_wall_clock(s.trim())
                .map_err(|message| OrmError::cast(field, message)),
            other => Err(OrmError::cast(
                field,
                format!("`{other}` is not a timestamp"),
            )),
        }
    }

    /// Reads a JSON array field into a collection.
    ///
    /// # Errors
    ///
    /// Fails when the stored JSON is not an array of `T`.
    pub fn collection<T: DeserializeOwned>(&self, field: &str) -> Result<Collection<T>> {
        self.check(field, Cast::Collection)?;
        let json = match self.raw(field) {
            SqlValue::Null => return Ok(Collection::new()),
            SqlValue::Text(s) => s,
            SqlValue::Blob(bytes) => String::from_utf8(bytes)
                .map_err(|_| OrmError::cast(field, "blob is not UTF-8"))?,
            other => {
                return Err(OrmError::cast(
                    field,
                    format!("`{other}` is not a JSON array"),
                ))
            }
        };
        if json.trim().is_empty() {
            return Ok(Collection::new());
        }
        serde_json::from_str::<Vec<T>>(&json)
            .map(Collection::from)
            .map_err(|e| OrmError::cast(field, e.to_string()))
    }

    /// Reads a text field; missing and NULL are empty.
    #[must_use]
    pub fn text(&self, field: &str) -> String {
        self.optional_text(field).unwrap_or_default()
    }

    /// Reads a nullable text field. Numbers are rendered as text.
    #[must_use]
    pub fn optional_text(&self, field: &str) -> Option<String> {
        match self.raw(field) {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    fn check(&self, field: &str, requested: Cast) -> Result<()> {
        match self.declared(field) {
            Some(declared) if declared != requested => Err(OrmError::CastMismatch {
                field: field.to_string(),
                declared,
                requested,
            }),
            _ => Ok(()),
        }
    }
}

fn parse_wall_clock(s: &str) -> std::result::Result<Option<DateTime<Utc>>, String> {
    if s.is_empty() || s == ZERO_DATETIME {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| format!("`{s}` is not a timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const CASTS: &[(&str, Cast)] = &[
        ("id", Cast::Integer),
        ("is_resolved", Cast::Boolean),
        ("created_at", Cast::Timestamp),
        ("tags", Cast::Collection),
    ];

    fn attrs(row: &Row) -> Attributes<'_> {
        Attributes::new(row, CASTS)
    }

    #[test]
    fn test_boolean_spellings() {
        for (raw, expected) in [
            (SqlValue::Text("1".into()), true),
            (SqlValue::Text("0".into()), false),
            (SqlValue::Int(1), true),
            (SqlValue::Int(0), false),
            (SqlValue::Text("true".into()), true),
            (SqlValue::Null, false),
        ] {
            let row = Row::new().with("is_resolved", raw);
            assert_eq!(attrs(&row).boolean("is_resolved").unwrap(), expected);
        }
        let row = Row::new().with("is_resolved", "maybe");
        assert!(attrs(&row).boolean("is_resolved").is_err());
    }

    #[test]
    fn test_missing_fields_are_zero_values() {
        let row = Row::new();
        let a = attrs(&row);
        assert_eq!(a.integer("id").unwrap(), 0);
        assert!(!a.boolean("is_resolved").unwrap());
        assert_eq!(a.timestamp("created_at").unwrap(), None);
        assert!(a.collection::<i64>("tags").unwrap().is_empty());
        assert_eq!(a.text("content"), "");
    }

    #[test]
    fn test_integer_from_text() {
        let row = Row::new().with("id", "17");
        assert_eq!(attrs(&row).integer("id").unwrap(), 17);
        let row = Row::new().with("id", "seventeen");
        assert!(matches!(
            attrs(&row).integer("id"),
            Err(OrmError::Cast { .. })
        ));
    }

    #[test]
    fn test_timestamp_is_wall_clock_utc() {
        let row = Row::new().with("created_at", "2024-03-05 14:30:00");
        let ts = attrs(&row).timestamp("created_at").unwrap().unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!((ts.hour(), ts.minute()), (14, 30));

        let row = Row::new().with("created_at", ZERO_DATETIME);
        assert_eq!(attrs(&row).timestamp("created_at").unwrap(), None);

        let row = Row::new().with("created_at", 0);
        assert_eq!(
            attrs(&row).timestamp("created_at").unwrap(),
            DateTime::from_timestamp(0, 0)
        );
    }

    #[test]
    fn test_collection_from_json() {
        let row = Row::new().with("tags", "[1, 2, 3]");
        let tags = attrs(&row).collection::<i64>("tags").unwrap();
        assert_eq!(tags.into_vec(), vec![1, 2, 3]);

        let row = Row::new().with("tags", "{\"a\": 1}");
        assert!(attrs(&row).collection::<i64>("tags").is_err());
    }

    #[test]
    fn test_cast_mismatch() {
        let row = Row::new().with("id", 1);
        assert!(matches!(
            attrs(&row).boolean("id"),
            Err(OrmError::CastMismatch {
                declared: Cast::Integer,
                ..
            })
        ));
    }
}
