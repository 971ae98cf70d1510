//! Read-only statement guard.
//!
//! Every statement is parsed before it reaches the warehouse. Anything other
//! than a single read-only query is refused.

mod parser;

pub use parser::{inspect_sql, StatementGuard};

use crate::error::{InventoryError, Result};
use std::fmt;

/// How much a statement can change the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyLevel {
    /// Reads only (SELECT, plain EXPLAIN, SHOW).
    ReadOnly,
    /// Modifies rows (INSERT, UPDATE, MERGE).
    Mutating,
    /// Loses data or changes schema or grants (DELETE, DROP, ALTER, ...).
    Destructive,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Mutating => write!(f, "mutating"),
            Self::Destructive => write!(f, "destructive"),
        }
    }
}

/// The kind of statement detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Explain,
    Show,
    Insert,
    Update,
    Merge,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Grant,
    Revoke,
    /// More than one statement in the text.
    Multiple,
    /// Unparseable or unrecognised.
    Unknown,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "SELECT",
            Self::Explain => "EXPLAIN",
            Self::Show => "SHOW",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Merge => "MERGE",
            Self::Delete => "DELETE",
            Self::Drop => "DROP",
            Self::Truncate => "TRUNCATE",
            Self::Alter => "ALTER",
            Self::Create => "CREATE",
            Self::Grant => "GRANT",
            Self::Revoke => "REVOKE",
            Self::Multiple => "multi-statement",
            Self::Unknown => "unrecognised",
        };
        f.write_str(name)
    }
}

/// Outcome of inspecting a SQL string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub level: SafetyLevel,
    pub kind: StatementKind,
}

impl Verdict {
    pub fn new(level: SafetyLevel, kind: StatementKind) -> Self {
        Self { level, kind }
    }

    pub fn is_read_only(&self) -> bool {
        self.level == SafetyLevel::ReadOnly
    }
}

/// Fails with [`InventoryError::Rejected`] unless `sql` is a single read-only
/// statement.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let verdict = inspect_sql(sql);
    if verdict.is_read_only() {
        Ok(())
    } else {
        Err(InventoryError::rejected(format!(
            "{} statement is {}",
            verdict.kind, verdict.level
        )))
    }
}
