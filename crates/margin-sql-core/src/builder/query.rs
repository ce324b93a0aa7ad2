//! Query state and its compilation to parameterized SQL.
//!
//! A `Query` is plain data. Every compile method takes `&self`, so compiling
//! twice yields identical output; the soft-delete default is added to a
//! temporary clause list, never to the stored state.

use std::borrow::Cow;

use super::predicate::{has_top_level_or, render_clauses, Clause, Predicate};
use super::writer::SqlWriter;
use crate::dialect::{Dialect, MySqlDialect};
use crate::error::{Result, SqlError};
use crate::row::Row;
use crate::value::SqlValue;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Parses an order specification.
    ///
    /// Prefix with `-` for descending order: `"-created_at"`.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(column) => Self {
                column: column.to_string(),
                direction: OrderDirection::Desc,
            },
            None => Self {
                column: spec.to_string(),
                direction: OrderDirection::Asc,
            },
        }
    }
}

/// A table with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Alias used to reference the table elsewhere in the query.
    pub alias: Option<String>,
}

impl TableRef {
    /// The name other clauses use to refer to this table.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn write(&self, w: &mut SqlWriter<'_>) {
        w.push_identifier(&self.name);
        if let Some(alias) = &self.alias {
            w.push(" AS ");
            w.push_identifier(alias);
        }
    }
}

/// One entry of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A quoted column, optionally aliased.
    Column {
        /// Column name, possibly qualified or `table.*`.
        name: String,
        /// Output alias.
        alias: Option<String>,
    },
    /// An unquoted expression such as `COUNT(*)`.
    Raw {
        /// SQL expression, emitted verbatim.
        expression: String,
        /// Output alias.
        alias: Option<String>,
    },
    /// A correlated scalar subquery.
    Sub {
        /// The subquery.
        query: Box<Query>,
        /// Output alias.
        alias: String,
    },
}

impl SelectItem {
    /// The column name this item produces in the result row.
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Self::Column { alias: Some(a), .. } | Self::Raw { alias: Some(a), .. } => Some(a),
            Self::Sub { alias, .. } => Some(alias),
            Self::Column { name, alias: None } => name.rsplit('.').next(),
            Self::Raw { alias: None, .. } => None,
        }
    }

    fn write(&self, w: &mut SqlWriter<'_>) {
        match self {
            Self::Column { name, alias } => {
                w.push_identifier(name);
                write_alias(alias.as_deref(), w);
            }
            Self::Raw { expression, alias } => {
                w.push(expression);
                write_alias(alias.as_deref(), w);
            }
            Self::Sub { query, alias } => {
                w.push("(");
                query.write_select(w);
                w.push(")");
                write_alias(Some(alias), w);
            }
        }
    }
}

fn write_alias(alias: Option<&str>, w: &mut SqlWriter<'_>) {
    if let Some(alias) = alias {
        w.push(" AS ");
        w.push_identifier(alias);
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN
    Inner,
    /// LEFT JOIN
    Left,
}

/// A JOIN with its ON predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join type.
    pub kind: JoinKind,
    /// Joined table.
    pub table: TableRef,
    /// ON clauses; rendered like WHERE.
    pub on: Vec<Clause>,
}

/// Which soft-deleted rows a query sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrashedScope {
    /// Only rows whose soft-delete column is NULL.
    #[default]
    Exclude,
    /// All rows.
    Include,
    /// Only soft-deleted rows.
    Only,
}

/// Soft-delete configuration of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftDelete {
    /// Column holding the deletion timestamp.
    pub column: String,
    /// Visibility of deleted rows.
    pub scope: TrashedScope,
}

/// Accumulated state of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub(crate) table: Option<TableRef>,
    pub(crate) distinct: bool,
    pub(crate) selects: Vec<SelectItem>,
    pub(crate) joins: Vec<Join>,
    pub(crate) wheres: Vec<Clause>,
    pub(crate) groups: Vec<String>,
    pub(crate) havings: Vec<Clause>,
    pub(crate) orders: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) soft_delete: Option<SoftDelete>,
}

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the primary table, if set.
    #[must_use]
    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    /// Returns the SELECT list.
    #[must_use]
    pub fn selects(&self) -> &[SelectItem] {
        &self.selects
    }

    /// Returns the user-supplied WHERE clauses.
    #[must_use]
    pub fn wheres(&self) -> &[Clause] {
        &self.wheres
    }

    /// Returns the soft-delete configuration, if any.
    #[must_use]
    pub fn soft_delete(&self) -> Option<&SoftDelete> {
        self.soft_delete.as_ref()
    }

    /// Returns whether a SELECT entry already produces `name`.
    #[must_use]
    pub fn is_column_selected(&self, name: &str) -> bool {
        self.selects
            .iter()
            .any(|item| item.output_name() == Some(name))
    }

    /// Compiles the SELECT statement with MySQL quoting.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        self.to_sql_with(&MySqlDialect)
    }

    /// Compiles the SELECT statement with the given dialect's quoting.
    #[must_use]
    pub fn to_sql_with(&self, dialect: &dyn Dialect) -> (String, Vec<SqlValue>) {
        let mut w = SqlWriter::new(dialect);
        self.write_select(&mut w);
        w.finish()
    }

    /// Compiles a `COUNT(*)` over this query.
    ///
    /// Grouped or distinct queries are wrapped in a derived table so the
    /// count is of result rows, not of groups within one row. Without an
    /// explicit select list the derived table projects `1`, since joined
    /// tables may share column names.
    #[must_use]
    pub fn count_sql_with(&self, dialect: &dyn Dialect) -> (String, Vec<SqlValue>) {
        let mut inner = self.clone();
        inner.orders.clear();
        inner.limit = None;
        inner.offset = None;

        let mut w = SqlWriter::new(dialect);
        if inner.distinct || !inner.groups.is_empty() || !inner.havings.is_empty() {
            if inner.selects.is_empty() && !inner.distinct {
                inner.selects.push(SelectItem::Raw {
                    expression: "1".to_string(),
                    alias: None,
                });
            }
            w.push("SELECT COUNT(*) AS ");
            w.push_identifier("aggregate");
            w.push(" FROM (");
            inner.write_select(&mut w);
            w.push(") AS ");
            w.push_identifier("counted");
        } else {
            inner.selects = vec![SelectItem::Raw {
                expression: "COUNT(*)".to_string(),
                alias: Some("aggregate".to_string()),
            }];
            inner.write_select(&mut w);
        }
        w.finish()
    }

    /// Compiles a single- or multi-row INSERT.
    ///
    /// Every row must carry the same columns in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if no table is set, `rows` is empty or has no
    /// columns, or the rows' column lists differ.
    pub fn insert_sql_with(
        &self,
        dialect: &dyn Dialect,
        rows: &[Row],
    ) -> Result<(String, Vec<SqlValue>)> {
        let table = self.table.as_ref().ok_or(SqlError::MissingTable("INSERT"))?;
        let first = rows
            .first()
            .filter(|row| !row.is_empty())
            .ok_or(SqlError::EmptyFields("INSERT"))?;
        let columns: Vec<&str> = first.iter().map(|(name, _)| name).collect();
        if rows
            .iter()
            .any(|row| !row.iter().map(|(name, _)| name).eq(columns.iter().copied()))
        {
            return Err(SqlError::MismatchedRows);
        }

        let mut w = SqlWriter::new(dialect);
        w.push("INSERT INTO ");
        w.push_identifier(&table.name);
        w.push(" (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_identifier(column);
        }
        w.push(") VALUES ");
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push("(");
            for (j, (_, value)) in row.iter().enumerate() {
                if j > 0 {
                    w.push(", ");
                }
                w.push_param(value.clone());
            }
            w.push(")");
        }
        Ok(w.finish())
    }

    /// Compiles an UPDATE of `fields` over the rows this query matches.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnconstrainedMutation`] when no WHERE clause was
    /// added, and an error if no table is set or `fields` is empty.
    pub fn update_sql_with(
        &self,
        dialect: &dyn Dialect,
        fields: &Row,
    ) -> Result<(String, Vec<SqlValue>)> {
        let table = self.guard_mutation("UPDATE")?;
        if fields.is_empty() {
            return Err(SqlError::EmptyFields("UPDATE"));
        }

        let mut w = SqlWriter::new(dialect);
        w.push("UPDATE ");
        table.write(&mut w);
        w.push(" SET ");
        for (i, (column, value)) in fields.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_identifier(column);
            w.push(" = ");
            w.push_param(value.clone());
        }
        self.write_where(&mut w, table.reference());
        Ok(w.finish())
    }

    /// Compiles a DELETE of the rows this query matches.
    ///
    /// The table alias is not rendered; conditions must use the table name,
    /// and the soft-delete default is qualified with it too.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnconstrainedMutation`] when no WHERE clause was
    /// added, and an error if no table is set.
    pub fn delete_sql_with(&self, dialect: &dyn Dialect) -> Result<(String, Vec<SqlValue>)> {
        let table = self.guard_mutation("DELETE")?;

        let mut w = SqlWriter::new(dialect);
        w.push("DELETE FROM ");
        w.push_identifier(&table.name);
        self.write_where(&mut w, &table.name);
        Ok(w.finish())
    }

    fn guard_mutation(&self, statement: &'static str) -> Result<&TableRef> {
        let table = self.table.as_ref().ok_or(SqlError::MissingTable(statement))?;
        // The soft-delete default alone never counts as a constraint, and
        // neither does a group that renders nothing.
        if self.wheres.iter().all(|c| c.predicate.renders_nothing()) {
            return Err(SqlError::UnconstrainedMutation {
                statement,
                table: table.name.clone(),
            });
        }
        Ok(table)
    }

    /// Writes the full SELECT statement. Parameters are emitted in placeholder
    /// order: select list, joins, where, having.
    pub(crate) fn write_select(&self, w: &mut SqlWriter<'_>) {
        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }
        if self.selects.is_empty() {
            w.push("*");
        }
        for (i, item) in self.selects.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            item.write(w);
        }

        if let Some(table) = &self.table {
            w.push(" FROM ");
            table.write(w);
        }

        for join in &self.joins {
            w.push(match join.kind {
                JoinKind::Inner => " INNER JOIN ",
                JoinKind::Left => " LEFT JOIN ",
            });
            join.table.write(w);
            if !join.on.is_empty() {
                w.push(" ON ");
                render_clauses(&join.on, w);
            }
        }

        self.write_where(w, self.table.as_ref().map_or("", TableRef::reference));

        if !self.groups.is_empty() {
            w.push(" GROUP BY ");
            for (i, column) in self.groups.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_identifier(column);
            }
        }

        if !self.havings.is_empty() {
            w.push(" HAVING ");
            render_clauses(&self.havings, w);
        }

        if !self.orders.is_empty() {
            w.push(" ORDER BY ");
            for (i, order) in self.orders.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_identifier(&order.column);
                w.push(match order.direction {
                    OrderDirection::Asc => " ASC",
                    OrderDirection::Desc => " DESC",
                });
            }
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => w.push(&format!(" LIMIT {limit}")),
            // OFFSET is only valid after a LIMIT.
            (None, Some(_)) => {
                let unbounded = w.dialect().unbounded_limit();
                w.push(&format!(" LIMIT {unbounded}"));
            }
            (None, None) => {}
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }
    }

    /// Writes WHERE with the soft-delete default qualified by `reference`.
    fn write_where(&self, w: &mut SqlWriter<'_>, reference: &str) {
        let clauses = self.scoped_wheres(reference);
        if clauses.iter().any(|c| !c.predicate.renders_nothing()) {
            w.push(" WHERE ");
            render_clauses(&clauses, w);
        }
    }

    /// The WHERE clauses with the soft-delete default applied.
    fn scoped_wheres(&self, reference: &str) -> Cow<'_, [Clause]> {
        let Some(soft) = &self.soft_delete else {
            return Cow::Borrowed(&self.wheres);
        };
        let column = if reference.is_empty() || soft.column.contains('.') {
            soft.column.clone()
        } else {
            format!("{reference}.{}", soft.column)
        };
        let negated = match soft.scope {
            TrashedScope::Include => return Cow::Borrowed(&self.wheres),
            TrashedScope::Exclude => false,
            TrashedScope::Only => true,
        };
        if self
            .wheres
            .iter()
            .any(|c| c.predicate.references(&column) || c.predicate.references(&soft.column))
        {
            return Cow::Borrowed(&self.wheres);
        }

        let mut clauses = Vec::with_capacity(self.wheres.len() + 1);
        if has_top_level_or(&self.wheres) {
            clauses.push(Clause::and(Predicate::Group(self.wheres.clone())));
        } else {
            clauses.extend(self.wheres.iter().cloned());
        }
        clauses.push(Clause::and(Predicate::Null { column, negated }));
        Cow::Owned(clauses)
    }

    /// Qualifies a bare column with the primary table's reference name.
    #[must_use]
    pub fn qualify(&self, column: &str) -> String {
        match &self.table {
            Some(table) if !column.contains('.') => format!("{}.{column}", table.reference()),
            _ => column.to_string(),
        }
    }
}
