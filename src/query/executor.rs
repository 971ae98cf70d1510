//! Query execution against a per-request warehouse connection.
//!
//! Statements are built from configured table names and composed clauses,
//! checked by the read-only guard, then run sequentially on one connection
//! which is closed before returning.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::compose::{OrderByClause, WhereClause};
use super::page::PageRequest;
use crate::config::TablesConfig;
use crate::db::{Connector, DatabaseClient, Dialect, QueryResult, Statement};
use crate::error::{InventoryError, Result};
use crate::safety::ensure_read_only;

/// Everything the data endpoint needs to build its two statements.
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    pub filter: WhereClause,
    pub order_by: OrderByClause,
    pub page: PageRequest,
}

/// One page of asset rows plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct DataPage {
    pub total: i64,
    pub result: QueryResult,
}

/// Runs inventory queries through a [`Connector`].
pub struct QueryExecutor<'a> {
    connector: &'a dyn Connector,
    tables: &'a TablesConfig,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(connector: &'a dyn Connector, tables: &'a TablesConfig) -> Self {
        Self { connector, tables }
    }

    /// Counts the rows matching the filter, then fetches the requested page.
    pub async fn fetch_page(&self, query: &DataQuery) -> Result<DataPage> {
        let mut client = self.connector.open().await?;
        let outcome = self.page_on(client.as_mut(), query).await;
        close_quietly(client.as_mut()).await;
        outcome
    }

    /// Fetches the raw `(category, type, count)` rows.
    pub async fn fetch_classification(&self) -> Result<QueryResult> {
        let mut client = self.connector.open().await?;
        let statement = classification_statement(&self.tables.counts);
        let outcome = run(client.as_mut(), &statement).await;
        close_quietly(client.as_mut()).await;
        outcome
    }

    async fn page_on(&self, client: &mut dyn DatabaseClient, query: &DataQuery) -> Result<DataPage> {
        let dialect = client.dialect();
        debug!(
            "Composed filter: {}",
            query.filter.render_inline(dialect)
        );

        let count = count_statement(&self.tables.assets, &query.filter, dialect);
        let count_result = run(client, &count).await?;
        let total = count_result
            .scalar()
            .and_then(|value| value.as_i64())
            .ok_or_else(|| InventoryError::query("Count query returned no total"))?;

        let data = data_statement(&self.tables.assets, query, dialect);
        let result = run(client, &data).await?;

        Ok(DataPage { total, result })
    }
}

/// Guards, logs, and executes one statement.
async fn run(client: &mut dyn DatabaseClient, statement: &Statement) -> Result<QueryResult> {
    ensure_read_only(&statement.sql)?;

    debug!("Executing: {}", statement);
    let start = Instant::now();
    let result = client.execute_query(statement).await?;
    info!(
        "Statement returned {} rows in {:?}",
        result.row_count,
        start.elapsed()
    );
    Ok(result)
}

async fn close_quietly(client: &mut dyn DatabaseClient) {
    if let Err(e) = client.close().await {
        warn!("Failed to close warehouse connection: {}", e);
    }
}

/// Joins non-empty SQL fragments with single spaces.
fn join_sql(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `SELECT COUNT(*) AS total FROM <table> [WHERE ...]`
pub fn count_statement(table: &str, filter: &WhereClause, dialect: Dialect) -> Statement {
    let mut params = Vec::new();
    let from = format!("SELECT COUNT(*) AS total FROM {table}");
    let where_sql = filter.render(dialect, &mut params);
    Statement::new(join_sql(&[&from, &where_sql])).with_params(params)
}

/// `SELECT * FROM <table> [WHERE ...] [ORDER BY ...] LIMIT n OFFSET m`
pub fn data_statement(table: &str, query: &DataQuery, dialect: Dialect) -> Statement {
    let mut params = Vec::new();
    let from = format!("SELECT * FROM {table}");
    let where_sql = query.filter.render(dialect, &mut params);
    let order_sql = query.order_by.render(dialect);
    let limit = format!(
        "LIMIT {} OFFSET {}",
        query.page.page_size,
        query.page.offset()
    );
    Statement::new(join_sql(&[&from, &where_sql, &order_sql, &limit])).with_params(params)
}

/// `SELECT resource_category, resource_type, total_count FROM <table>`
pub fn classification_statement(table: &str) -> Statement {
    Statement::new(format!(
        "SELECT resource_category, resource_type, total_count FROM {table}"
    ))
}
