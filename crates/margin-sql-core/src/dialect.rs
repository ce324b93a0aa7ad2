//! SQL dialect support.
//!
//! The builder only needs dialect knowledge for identifier quoting; values are
//! always bound with `?` placeholders.

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes a possibly dotted identifier segment by segment.
    ///
    /// `notes.id` becomes `` `notes`.`id` `` under MySQL; `*` is left bare so
    /// that `notes.*` stays a valid select-all.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let doubled = format!("{quote}{quote}");
        name.split('.')
            .map(|segment| {
                if segment == "*" {
                    String::from("*")
                } else {
                    let escaped = segment.replace(quote, &doubled);
                    format!("{quote}{escaped}{quote}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The LIMIT value written when a query has an OFFSET but no LIMIT.
    fn unbounded_limit(&self) -> &'static str {
        "18446744073709551615"
    }
}

/// MySQL / MariaDB: backtick quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }
}
