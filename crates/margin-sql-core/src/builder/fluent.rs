//! The chainable builder surface shared by every query type.
//!
//! Implementors only expose their [`Query`]; the provided methods consume
//! `self` and return it, so a whole query is one expression:
//!
//! ```
//! use margin_sql_core::{Builder, CompareOp, Query};
//!
//! let query = Query::new()
//!     .from("notes")
//!     .where_eq("document_id", 7)
//!     .where_group(|q| q.where_eq("author_id", 2).or_where("is_resolved", CompareOp::Eq, 0))
//!     .order_by("-created_at");
//! let (sql, params) = query.to_sql();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM `notes` WHERE `document_id` = ? AND (`author_id` = ? OR `is_resolved` = ?) ORDER BY `created_at` DESC"
//! );
//! assert_eq!(params.len(), 3);
//! ```

use super::predicate::{Clause, CompareOp, Connector, Predicate};
use super::query::{Join, JoinKind, OrderBy, Query, SelectItem, SoftDelete, TableRef, TrashedScope};
use crate::value::{SqlValue, ToSqlValue};

/// Fluent query-building methods.
pub trait Builder: Sized {
    /// Returns the accumulated query.
    fn query(&self) -> &Query;

    /// Returns the accumulated query for mutation.
    fn query_mut(&mut self) -> &mut Query;

    /// Sets the primary table.
    #[must_use]
    fn from(mut self, table: &str) -> Self {
        self.query_mut().table = Some(TableRef {
            name: table.to_string(),
            alias: None,
        });
        self
    }

    /// Sets the primary table with an alias.
    #[must_use]
    fn from_as(mut self, table: &str, alias: &str) -> Self {
        self.query_mut().table = Some(TableRef {
            name: table.to_string(),
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Appends quoted columns to the SELECT list.
    #[must_use]
    fn select(mut self, columns: &[&str]) -> Self {
        self.query_mut()
            .selects
            .extend(columns.iter().map(|name| SelectItem::Column {
                name: (*name).to_string(),
                alias: None,
            }));
        self
    }

    /// Appends one aliased column.
    #[must_use]
    fn select_as(mut self, column: &str, alias: &str) -> Self {
        self.query_mut().selects.push(SelectItem::Column {
            name: column.to_string(),
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Appends raw expressions, emitted without quoting.
    #[must_use]
    fn select_raw(mut self, expressions: &[&str]) -> Self {
        self.query_mut()
            .selects
            .extend(expressions.iter().map(|e| SelectItem::Raw {
                expression: (*e).to_string(),
                alias: None,
            }));
        self
    }

    /// Makes the query return distinct rows.
    #[must_use]
    fn distinct(mut self) -> Self {
        self.query_mut().distinct = true;
        self
    }

    /// Adds a correlated scalar subquery as the column `alias`.
    ///
    /// Does nothing if `alias` is already selected. When the SELECT list is
    /// still empty, `table.*` is selected first so the base columns survive.
    #[must_use]
    fn add_sub_select<F>(mut self, alias: &str, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        if self.query().is_column_selected(alias) {
            return self;
        }
        let query = self.query_mut();
        if query.selects.is_empty() {
            let all = query
                .table
                .as_ref()
                .map_or_else(|| "*".to_string(), |t| format!("{}.*", t.reference()));
            query.selects.push(SelectItem::Column {
                name: all,
                alias: None,
            });
        }
        query.selects.push(SelectItem::Sub {
            query: Box::new(build(Query::new())),
            alias: alias.to_string(),
        });
        self
    }

    /// Returns whether a SELECT entry already produces `name`.
    fn is_column_selected(&self, name: &str) -> bool {
        self.query().is_column_selected(name)
    }

    /// Appends a WHERE predicate with an explicit connector.
    #[must_use]
    fn push_where(mut self, connector: Connector, predicate: Predicate) -> Self {
        self.query_mut().wheres.push(Clause {
            connector,
            predicate,
        });
        self
    }

    /// `AND column op value`
    #[must_use]
    fn and_where<V: ToSqlValue>(self, column: &str, op: CompareOp, value: V) -> Self {
        self.push_where(Connector::And, comparison(column, op, value))
    }

    /// `OR column op value`
    #[must_use]
    fn or_where<V: ToSqlValue>(self, column: &str, op: CompareOp, value: V) -> Self {
        self.push_where(Connector::Or, comparison(column, op, value))
    }

    /// `AND column = value`
    #[must_use]
    fn where_eq<V: ToSqlValue>(self, column: &str, value: V) -> Self {
        self.and_where(column, CompareOp::Eq, value)
    }

    /// `AND (...)`, the group built by `build` on an empty query.
    #[must_use]
    fn where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let group = build(Query::new()).wheres;
        self.push_where(Connector::And, Predicate::Group(group))
    }

    /// `OR (...)`
    #[must_use]
    fn or_where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let group = build(Query::new()).wheres;
        self.push_where(Connector::Or, Predicate::Group(group))
    }

    /// `AND column IN (...)`; an empty list matches nothing.
    #[must_use]
    fn where_in<V, I>(self, column: &str, values: I) -> Self
    where
        V: ToSqlValue,
        I: IntoIterator<Item = V>,
    {
        self.push_where(Connector::And, in_list(column, values, false))
    }

    /// `OR column IN (...)`
    #[must_use]
    fn or_where_in<V, I>(self, column: &str, values: I) -> Self
    where
        V: ToSqlValue,
        I: IntoIterator<Item = V>,
    {
        self.push_where(Connector::Or, in_list(column, values, false))
    }

    /// `AND column NOT IN (...)`; an empty list matches everything.
    #[must_use]
    fn where_not_in<V, I>(self, column: &str, values: I) -> Self
    where
        V: ToSqlValue,
        I: IntoIterator<Item = V>,
    {
        self.push_where(Connector::And, in_list(column, values, true))
    }

    /// `AND column IS NULL`
    #[must_use]
    fn where_null(self, column: &str) -> Self {
        self.push_where(
            Connector::And,
            Predicate::Null {
                column: column.to_string(),
                negated: false,
            },
        )
    }

    /// `OR column IS NULL`
    #[must_use]
    fn or_where_null(self, column: &str) -> Self {
        self.push_where(
            Connector::Or,
            Predicate::Null {
                column: column.to_string(),
                negated: false,
            },
        )
    }

    /// `AND column IS NOT NULL`
    #[must_use]
    fn where_not_null(self, column: &str) -> Self {
        self.push_where(
            Connector::And,
            Predicate::Null {
                column: column.to_string(),
                negated: true,
            },
        )
    }

    /// `AND left op right` between two columns.
    #[must_use]
    fn where_column(self, left: &str, op: CompareOp, right: &str) -> Self {
        self.push_where(Connector::And, column_comparison(left, op, right))
    }

    /// `OR left op right` between two columns.
    #[must_use]
    fn or_where_column(self, left: &str, op: CompareOp, right: &str) -> Self {
        self.push_where(Connector::Or, column_comparison(left, op, right))
    }

    /// `AND EXISTS (subquery)`
    #[must_use]
    fn where_exists<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_where(Connector::And, exists(build, false))
    }

    /// `OR EXISTS (subquery)`
    #[must_use]
    fn or_where_exists<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_where(Connector::Or, exists(build, false))
    }

    /// `AND NOT EXISTS (subquery)`
    #[must_use]
    fn where_not_exists<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_where(Connector::And, exists(build, true))
    }

    /// `AND <sql>` with its own parameters. `sql` must not contain user input.
    #[must_use]
    fn where_raw(self, sql: &str, params: Vec<SqlValue>) -> Self {
        self.push_where(
            Connector::And,
            Predicate::Raw {
                sql: sql.to_string(),
                params,
            },
        )
    }

    /// `INNER JOIN table [AS alias] ON ...`; the ON tree is built like WHERE.
    #[must_use]
    fn join<F>(self, table: &str, alias: Option<&str>, on: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_join(JoinKind::Inner, table, alias, on)
    }

    /// `LEFT JOIN table [AS alias] ON ...`
    #[must_use]
    fn left_join<F>(self, table: &str, alias: Option<&str>, on: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_join(JoinKind::Left, table, alias, on)
    }

    #[doc(hidden)]
    #[must_use]
    fn push_join<F>(mut self, kind: JoinKind, table: &str, alias: Option<&str>, on: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let on = on(Query::new()).wheres;
        self.query_mut().joins.push(Join {
            kind,
            table: TableRef {
                name: table.to_string(),
                alias: alias.map(str::to_string),
            },
            on,
        });
        self
    }

    /// Appends GROUP BY columns.
    #[must_use]
    fn group_by(mut self, columns: &[&str]) -> Self {
        self.query_mut()
            .groups
            .extend(columns.iter().map(|c| (*c).to_string()));
        self
    }

    /// `AND <expression>` in HAVING, for aggregate-derived filters.
    #[must_use]
    fn having_raw(mut self, expression: &str) -> Self {
        self.query_mut().havings.push(Clause::and(raw(expression)));
        self
    }

    /// `OR <expression>` in HAVING.
    #[must_use]
    fn or_having_raw(mut self, expression: &str) -> Self {
        self.query_mut().havings.push(Clause::or(raw(expression)));
        self
    }

    /// Appends an ordering; prefix with `-` for descending.
    #[must_use]
    fn order_by(mut self, spec: &str) -> Self {
        self.query_mut().orders.push(OrderBy::parse(spec));
        self
    }

    /// Limits the number of results.
    #[must_use]
    fn limit(mut self, n: u64) -> Self {
        self.query_mut().limit = Some(n);
        self
    }

    /// Sets the offset for pagination.
    #[must_use]
    fn offset(mut self, n: u64) -> Self {
        self.query_mut().offset = Some(n);
        self
    }

    /// Applies `f` only when `condition` holds.
    #[must_use]
    fn when<F>(self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition {
            f(self)
        } else {
            self
        }
    }

    /// Declares `column` as the soft-delete marker; deleted rows are hidden.
    #[must_use]
    fn soft_deletes(mut self, column: &str) -> Self {
        self.query_mut().soft_delete = Some(SoftDelete {
            column: column.to_string(),
            scope: TrashedScope::Exclude,
        });
        self
    }

    /// Includes soft-deleted rows.
    #[must_use]
    fn with_trashed(self) -> Self {
        self.trashed_scope(TrashedScope::Include)
    }

    /// Returns only soft-deleted rows.
    #[must_use]
    fn only_trashed(self) -> Self {
        self.trashed_scope(TrashedScope::Only)
    }

    #[doc(hidden)]
    #[must_use]
    fn trashed_scope(mut self, scope: TrashedScope) -> Self {
        if let Some(soft) = self.query_mut().soft_delete.as_mut() {
            soft.scope = scope;
        }
        self
    }
}

impl Builder for Query {
    fn query(&self) -> &Query {
        self
    }

    fn query_mut(&mut self) -> &mut Query {
        self
    }
}

fn comparison<V: ToSqlValue>(column: &str, op: CompareOp, value: V) -> Predicate {
    Predicate::Comparison {
        column: column.to_string(),
        op,
        value: value.to_sql_value(),
    }
}

fn column_comparison(left: &str, op: CompareOp, right: &str) -> Predicate {
    Predicate::ColumnComparison {
        left: left.to_string(),
        op,
        right: right.to_string(),
    }
}

fn in_list<V, I>(column: &str, values: I, negated: bool) -> Predicate
where
    V: ToSqlValue,
    I: IntoIterator<Item = V>,
{
    Predicate::In {
        column: column.to_string(),
        values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        negated,
    }
}

fn exists<F: FnOnce(Query) -> Query>(build: F, negated: bool) -> Predicate {
    Predicate::Exists {
        query: Box::new(build(Query::new())),
        negated,
    }
}

fn raw(sql: &str) -> Predicate {
    Predicate::Raw {
        sql: sql.to_string(),
        params: Vec::new(),
    }
}
