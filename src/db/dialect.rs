//! Backend-specific SQL syntax.
//!
//! Identifier quoting and parameter placeholders differ between Databricks,
//! PostgreSQL and SQLite. Everything that renders SQL text goes through
//! [`Dialect`] so composed clauses stay portable.

use regex::Regex;
use std::sync::OnceLock;

/// SQL dialect of the connected warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Databricks SQL: backtick identifiers, named `:pN` parameters.
    Databricks,
    /// PostgreSQL: double-quoted identifiers, positional `$N` parameters.
    Postgres,
    /// SQLite: backtick identifiers, anonymous `?` parameters.
    Sqlite,
}

impl Dialect {
    /// Quotes a single column identifier.
    ///
    /// Callers must have checked the name with [`is_safe_identifier`]; the quote
    /// character is never escaped here.
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Self::Databricks | Self::Sqlite => format!("`{name}`"),
            Self::Postgres => format!("\"{name}\""),
        }
    }

    /// Returns the placeholder for the parameter at `index` (zero-based).
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Databricks => format!(":{}", parameter_name(index)),
            Self::Postgres => format!("${}", index + 1),
            Self::Sqlite => "?".to_string(),
        }
    }

    /// Renders the left-hand side of a text comparison against a column.
    ///
    /// Parameters are always bound as text. PostgreSQL will not compare text
    /// with other column types implicitly, so the column is cast there.
    pub fn text_operand(&self, name: &str) -> String {
        let quoted = self.quote_identifier(name);
        match self {
            Self::Postgres => format!("CAST({quoted} AS TEXT)"),
            Self::Databricks | Self::Sqlite => quoted,
        }
    }
}

/// Name of the Databricks named parameter at `index`.
pub fn parameter_name(index: usize) -> String {
    format!("p{index}")
}

/// Renders a string as a single-quoted SQL literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// Returns true if `name` is a plain column identifier that needs no escaping.
pub fn is_safe_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

/// Returns true if `name` is a dotted sequence of safe identifiers
/// (`catalog.schema.table`).
pub fn is_safe_table_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_safe_identifier)
}
