//! Predicate trees for WHERE, HAVING and JOIN ON clauses.
//!
//! A clause list is rendered left to right; every clause after the first is
//! prefixed by its connector. Groups are always parenthesized, so a nested
//! tree reads back unambiguously.

use std::fmt;

use super::query::Query;
use super::writer::SqlWriter;
use crate::value::SqlValue;

/// Boolean connector joining a clause to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// AND
    And,
    /// OR
    Or,
}

impl Connector {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Pattern match (LIKE)
    Like,
    /// Negated pattern match (NOT LIKE)
    NotLike,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

/// One node of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op ?`
    Comparison {
        /// Column name, optionally qualified.
        column: String,
        /// Operator.
        op: CompareOp,
        /// Bound value.
        value: SqlValue,
    },
    /// `left op right`, both sides identifiers.
    ColumnComparison {
        /// Left column.
        left: String,
        /// Operator.
        op: CompareOp,
        /// Right column.
        right: String,
    },
    /// `column [NOT] IN (?, ...)`
    In {
        /// Column name.
        column: String,
        /// Bound values.
        values: Vec<SqlValue>,
        /// NOT IN when true.
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null {
        /// Column name.
        column: String,
        /// IS NOT NULL when true.
        negated: bool,
    },
    /// `[NOT] EXISTS (subquery)`
    Exists {
        /// The subquery; may reference outer columns.
        query: Box<Query>,
        /// NOT EXISTS when true.
        negated: bool,
    },
    /// A parenthesized list of clauses.
    Group(Vec<Clause>),
    /// Raw SQL with its own parameters. Never put user input in `sql`.
    Raw {
        /// SQL fragment.
        sql: String,
        /// Parameters for the fragment's placeholders.
        params: Vec<SqlValue>,
    },
}

impl Predicate {
    /// Returns whether the predicate constrains `column` directly.
    ///
    /// Subqueries are not searched: they have their own scope.
    #[must_use]
    pub fn references(&self, column: &str) -> bool {
        match self {
            Self::Comparison { column: c, .. }
            | Self::In { column: c, .. }
            | Self::Null { column: c, .. } => c == column,
            Self::ColumnComparison { left, right, .. } => left == column || right == column,
            Self::Group(children) => children.iter().any(|c| c.predicate.references(column)),
            Self::Exists { .. } | Self::Raw { .. } => false,
        }
    }

    pub(crate) fn renders_nothing(&self) -> bool {
        match self {
            Self::Group(children) => children.iter().all(|c| c.predicate.renders_nothing()),
            _ => false,
        }
    }
}

/// A predicate together with the connector that joins it to its predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Connector to the previous clause; ignored for the first one.
    pub connector: Connector,
    /// The predicate.
    pub predicate: Predicate,
}

impl Clause {
    /// An AND clause.
    #[must_use]
    pub const fn and(predicate: Predicate) -> Self {
        Self {
            connector: Connector::And,
            predicate,
        }
    }

    /// An OR clause.
    #[must_use]
    pub const fn or(predicate: Predicate) -> Self {
        Self {
            connector: Connector::Or,
            predicate,
        }
    }
}

/// Returns whether any clause after the first is joined with OR.
pub(crate) fn has_top_level_or(clauses: &[Clause]) -> bool {
    clauses.iter().skip(1).any(|c| c.connector == Connector::Or)
}

/// Renders a clause list, depth first, preserving order.
pub fn render_clauses(clauses: &[Clause], w: &mut SqlWriter<'_>) {
    let mut first = true;
    for clause in clauses {
        if clause.predicate.renders_nothing() {
            continue;
        }
        if !first {
            w.push(" ");
            w.push(clause.connector.as_sql());
            w.push(" ");
        }
        render_predicate(&clause.predicate, w);
        first = false;
    }
}

fn render_predicate(predicate: &Predicate, w: &mut SqlWriter<'_>) {
    match predicate {
        Predicate::Comparison { column, op, value } => {
            w.push_identifier(column);
            w.push(&format!(" {op} "));
            w.push_param(value.clone());
        }
        Predicate::ColumnComparison { left, op, right } => {
            w.push_identifier(left);
            w.push(&format!(" {op} "));
            w.push_identifier(right);
        }
        Predicate::In {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // Nothing is IN an empty set; everything is NOT IN it.
                w.push(if *negated { "1 = 1" } else { "1 = 0" });
                return;
            }
            w.push_identifier(column);
            w.push(if *negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_param(value.clone());
            }
            w.push(")");
        }
        Predicate::Null { column, negated } => {
            w.push_identifier(column);
            w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        Predicate::Exists { query, negated } => {
            w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
            query.write_select(w);
            w.push(")");
        }
        Predicate::Group(children) => {
            w.push("(");
            render_clauses(children, w);
            w.push(")");
        }
        Predicate::Raw { sql, params } => {
            w.push(sql);
            w.extend_params(params.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySqlDialect;

    fn eq(column: &str, value: i64) -> Predicate {
        Predicate::Comparison {
            column: column.to_string(),
            op: CompareOp::Eq,
            value: SqlValue::Int(value),
        }
    }

    fn render(clauses: &[Clause]) -> (String, Vec<SqlValue>) {
        let mut w = SqlWriter::new(&MySqlDialect);
        render_clauses(clauses, &mut w);
        w.finish()
    }

    #[test]
    fn test_nested_or_group() {
        let clauses = vec![
            Clause::and(eq("a", 1)),
            Clause::or(Predicate::Group(vec![
                Clause::and(eq("c", 3)),
                Clause::or(eq("d", 4)),
            ])),
        ];
        let (sql, params) = render(&clauses);
        assert_eq!(sql, "`a` = ? OR (`c` = ? OR `d` = ?)");
        assert_eq!(
            params,
            vec![SqlValue::Int(1), SqlValue::Int(3), SqlValue::Int(4)]
        );
    }

    #[test]
    fn test_and_of_or_group() {
        let clauses = vec![
            Clause::and(eq("a", 1)),
            Clause::and(Predicate::Group(vec![
                Clause::and(eq("b", 2)),
                Clause::or(eq("c", 3)),
            ])),
        ];
        assert_eq!(render(&clauses).0, "`a` = ? AND (`b` = ? OR `c` = ?)");
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let clauses = vec![
            Clause::and(Predicate::Group(vec![])),
            Clause::or(eq("a", 1)),
            Clause::and(Predicate::Group(vec![Clause::and(Predicate::Group(vec![]))])),
        ];
        assert_eq!(render(&clauses).0, "`a` = ?");
    }

    #[test]
    fn test_empty_in_lists() {
        let clauses = vec![
            Clause::and(Predicate::In {
                column: "id".to_string(),
                values: vec![],
                negated: false,
            }),
            Clause::or(Predicate::In {
                column: "id".to_string(),
                values: vec![],
                negated: true,
            }),
        ];
        let (sql, params) = render(&clauses);
        assert_eq!(sql, "1 = 0 OR 1 = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_column_comparison_and_null() {
        let clauses = vec![
            Clause::and(Predicate::ColumnComparison {
                left: "r.parent_id".to_string(),
                op: CompareOp::Eq,
                right: "notes.id".to_string(),
            }),
            Clause::and(Predicate::Null {
                column: "r.trashed_at".to_string(),
                negated: false,
            }),
        ];
        assert_eq!(
            render(&clauses).0,
            "`r`.`parent_id` = `notes`.`id` AND `r`.`trashed_at` IS NULL"
        );
    }

    #[test]
    fn test_references() {
        let group = Predicate::Group(vec![Clause::and(Predicate::Null {
            column: "trashed_at".to_string(),
            negated: true,
        })]);
        assert!(group.references("trashed_at"));
        assert!(!group.references("id"));
    }
}
