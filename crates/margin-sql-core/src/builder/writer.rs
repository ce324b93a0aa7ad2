//! Accumulates SQL text and its positional parameters together, so the
//! parameter order always matches placeholder order.

use crate::dialect::Dialect;
use crate::value::SqlValue;

/// SQL text plus the parameters bound to its `?` placeholders.
pub struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    params: Vec<SqlValue>,
}

impl<'d> SqlWriter<'d> {
    /// Starts an empty statement.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Appends raw SQL text.
    pub fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends a quoted identifier.
    pub fn push_identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    /// Appends a placeholder and binds `value` to it.
    pub fn push_param(&mut self, value: SqlValue) {
        self.sql.push('?');
        self.params.push(value);
    }

    /// Binds parameters whose placeholders were already written.
    pub fn extend_params(&mut self, params: impl IntoIterator<Item = SqlValue>) {
        self.params.extend(params);
    }

    /// Returns the dialect in use.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Finishes the statement.
    #[must_use]
    pub fn finish(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}
