//! Model trait and hydration.
//!
//! A model is a plain struct with one field per column it cares about. The
//! trait carries the table name, the cast declaration and the constructor
//! that reads typed fields out of [`Attributes`]. Persistence never goes
//! through the instance; it flows back through [`ModelQuery`].

use margin_sql_core::{Collection, Connection, Row};

use crate::cast::{Attributes, Cast};
use crate::error::Result;
use crate::model_query::ModelQuery;

/// A database model.
///
/// # Example
///
/// ```
/// use margin_orm::{Attributes, Cast, Model, Result};
///
/// struct Document {
///     id: i64,
///     title: String,
///     is_archived: bool,
/// }
///
/// impl Model for Document {
///     const TABLE: &'static str = "documents";
///     const CASTS: &'static [(&'static str, Cast)] =
///         &[("id", Cast::Integer), ("is_archived", Cast::Boolean)];
///
///     fn from_attributes(attrs: &Attributes<'_>) -> Result<Self> {
///         Ok(Self {
///             id: attrs.integer("id")?,
///             title: attrs.text("title"),
///             is_archived: attrs.boolean("is_archived")?,
///         })
///     }
///
///     fn key(&self) -> i64 {
///         self.id
///     }
/// }
///
/// let row = margin_sql_core::Row::new().with("id", "4").with("is_archived", "1");
/// let doc = Document::hydrate(&row).unwrap();
/// assert_eq!(doc.id, 4);
/// assert!(doc.is_archived);
/// assert!(doc.title.is_empty());
/// ```
pub trait Model: Sized {
    /// Table name.
    const TABLE: &'static str;

    /// Primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Field casts applied during hydration.
    const CASTS: &'static [(&'static str, Cast)] = &[];

    /// Soft-delete column; when set, queries hide rows where it is not NULL.
    const SOFT_DELETE: Option<&'static str> = None;

    /// Builds the model from a row seen through [`Self::CASTS`].
    ///
    /// # Errors
    ///
    /// Returns a cast error when a stored value cannot be coerced.
    fn from_attributes(attrs: &Attributes<'_>) -> Result<Self>;

    /// The value of the primary key, used to match related rows.
    fn key(&self) -> i64;

    /// Converts one raw row into a model.
    ///
    /// # Errors
    ///
    /// Returns a cast error when a stored value cannot be coerced.
    fn hydrate(row: &Row) -> Result<Self> {
        Self::from_attributes(&Attributes::new(row, Self::CASTS))
    }

    /// Converts every row, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first cast error encountered.
    fn hydrate_all(rows: Collection<Row>) -> Result<Collection<Self>> {
        rows.iter().map(Self::hydrate).collect()
    }

    /// Starts a query over this model's table.
    fn objects(conn: &dyn Connection) -> ModelQuery<'_, Self> {
        ModelQuery::new(conn)
    }
}
