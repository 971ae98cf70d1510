//! SQL parsing for the read-only guard.
//!
//! Uses sqlparser-rs with the generic dialect, which understands backtick and
//! double-quoted identifiers as well as `?`, `$N` and `:name` placeholders.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use super::{SafetyLevel, StatementKind, Verdict};

/// Parses SQL text and decides whether it only reads.
#[derive(Debug)]
pub struct StatementGuard {
    dialect: GenericDialect,
}

impl Default for StatementGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementGuard {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    /// Inspects a SQL string.
    ///
    /// Text that does not parse, is empty, or holds more than one statement is
    /// treated as destructive.
    pub fn inspect(&self, sql: &str) -> Verdict {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => {
                debug!("Cannot parse statement for inspection: {}", e);
                return Verdict::new(SafetyLevel::Destructive, StatementKind::Unknown);
            }
        };

        match statements.as_slice() {
            [statement] => {
                let (level, kind) = inspect_statement(statement);
                Verdict::new(level, kind)
            }
            [] => Verdict::new(SafetyLevel::Destructive, StatementKind::Unknown),
            _ => Verdict::new(SafetyLevel::Destructive, StatementKind::Multiple),
        }
    }
}

/// Inspects SQL without keeping a guard around.
pub fn inspect_sql(sql: &str) -> Verdict {
    StatementGuard::new().inspect(sql)
}

/// Keeps whichever of two findings is more dangerous.
fn worse(a: (SafetyLevel, StatementKind), b: (SafetyLevel, StatementKind)) -> (SafetyLevel, StatementKind) {
    if b.0 > a.0 {
        b
    } else {
        a
    }
}

fn inspect_statement(statement: &Statement) -> (SafetyLevel, StatementKind) {
    match statement {
        // May hide data-modifying CTEs
        Statement::Query(query) => inspect_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE runs the inner statement
                let (level, _) = inspect_statement(statement);
                (level, StatementKind::Explain)
            } else {
                (SafetyLevel::ReadOnly, StatementKind::Explain)
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. } => (SafetyLevel::ReadOnly, StatementKind::Show),

        Statement::Insert(_) => (SafetyLevel::Mutating, StatementKind::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementKind::Update),
        Statement::Merge { .. } => (SafetyLevel::Mutating, StatementKind::Merge),

        Statement::Delete(_) => (SafetyLevel::Destructive, StatementKind::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementKind::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementKind::Truncate),
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => (SafetyLevel::Destructive, StatementKind::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. } => (SafetyLevel::Destructive, StatementKind::Create),
        Statement::Grant { .. } => (SafetyLevel::Destructive, StatementKind::Grant),
        Statement::Revoke { .. } => (SafetyLevel::Destructive, StatementKind::Revoke),

        _ => (SafetyLevel::Destructive, StatementKind::Unknown),
    }
}

fn inspect_query(query: &Query) -> (SafetyLevel, StatementKind) {
    let mut found = (SafetyLevel::ReadOnly, StatementKind::Select);

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            found = worse(found, inspect_query(&cte.query));
        }
    }

    worse(found, inspect_set_expr(&query.body))
}

fn inspect_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementKind) {
    match set_expr {
        SetExpr::Delete(stmt)
        | SetExpr::Update(stmt)
        | SetExpr::Insert(stmt)
        | SetExpr::Merge(stmt) => inspect_statement(stmt),
        SetExpr::Query(query) => inspect_query(query),
        SetExpr::Select(select) => inspect_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            worse(inspect_set_expr(left), inspect_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::ReadOnly, StatementKind::Select),
    }
}

fn inspect_select(select: &Select) -> (SafetyLevel, StatementKind) {
    select.from.iter().fold(
        (SafetyLevel::ReadOnly, StatementKind::Select),
        |found, twj| worse(found, inspect_table_with_joins(twj)),
    )
}

fn inspect_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementKind) {
    twj.joins.iter().fold(
        inspect_table_factor(&twj.relation),
        |found, join| worse(found, inspect_table_factor(&join.relation)),
    )
}

fn inspect_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementKind) {
    match factor {
        TableFactor::Derived { subquery, .. } => inspect_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => inspect_table_with_joins(table_with_joins),
        _ => (SafetyLevel::ReadOnly, StatementKind::Select),
    }
}
