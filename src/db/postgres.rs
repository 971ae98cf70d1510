//! PostgreSQL warehouse client.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient`
//! trait over a single sqlx connection. Useful for running the server against
//! a local copy of the inventory tables.

use crate::config::WarehouseConfig;
use crate::db::{ColumnInfo, DatabaseClient, Dialect, QueryResult, Row, Statement, Value};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgRow, Postgres};
use sqlx::{Column as SqlxColumn, Connection, Decode, Row as SqlxRow, Type, TypeInfo};
use uuid::Uuid;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// PostgreSQL client holding one connection.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a connection to the database named by `warehouse.url`.
    pub async fn connect(config: &WarehouseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| InventoryError::config("DATABASE_URL is not set"))?;

        let conn = PgConnection::connect(url)
            .await
            .map_err(|e| map_connection_error(e, url))?;

        debug!("Opened PostgreSQL connection");
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute_query(&mut self, statement: &Statement) -> Result<QueryResult> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| InventoryError::connection("Connection is closed"))?;

        let start = Instant::now();

        let mut query = sqlx::query(&statement.sql);
        for param in &statement.params {
            query = query.bind(param.as_str());
        }

        let result = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| InventoryError::query(format_query_error(e)))?;

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| InventoryError::connection(format!("Failed to close connection: {e}")))?;
            debug!("Closed PostgreSQL connection");
        }
        Ok(())
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),

        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Opaque(v.to_string()))
            .unwrap_or(Value::Null),

        "NUMERIC" => decode_opaque(row, index, type_name, |v: Decimal| v.to_string()),
        "TIMESTAMPTZ" => decode_opaque(row, index, type_name, |v: DateTime<Utc>| v.to_rfc3339()),
        "TIMESTAMP" => decode_opaque(row, index, type_name, |v: NaiveDateTime| v.to_string()),
        "DATE" => decode_opaque(row, index, type_name, |v: NaiveDate| v.to_string()),
        "TIME" => decode_opaque(row, index, type_name, |v: NaiveTime| v.to_string()),
        "UUID" => decode_opaque(row, index, type_name, |v: Uuid| v.to_string()),

        "TEXT[]" | "VARCHAR[]" | "NAME[]" => {
            decode_opaque(row, index, type_name, |v: Vec<String>| json_array(&v))
        }
        "INT4[]" => decode_opaque(row, index, type_name, |v: Vec<i32>| json_array(&v)),
        "INT8[]" => decode_opaque(row, index, type_name, |v: Vec<i64>| json_array(&v)),

        // Remaining types keep whatever textual form sqlx can decode
        _ => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => v.map(Value::Opaque).unwrap_or(Value::Null),
            Err(e) => {
                debug!("Cannot decode {} column {}: {}", type_name, index, e);
                Value::Null
            }
        },
    }
}

/// Decodes a non-primitive column and keeps its textual form.
///
/// Only a SQL NULL becomes `Value::Null`; decode failures are logged.
fn decode_opaque<'r, T>(
    row: &'r PgRow,
    index: usize,
    type_name: &str,
    render: impl FnOnce(T) -> String,
) -> Value
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    match row.try_get::<Option<T>, _>(index) {
        Ok(v) => v.map(|v| Value::Opaque(render(v))).unwrap_or(Value::Null),
        Err(e) => {
            debug!("Cannot decode {} column {}: {}", type_name, index, e);
            Value::Null
        }
    }
}

fn json_array<T: serde::Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, url: &str) -> InventoryError {
    let (host, port, user, database) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or("localhost").to_string(),
            parsed.port().unwrap_or(5432),
            parsed.username().to_string(),
            parsed.path().trim_start_matches('/').to_string(),
        ),
        Err(_) => ("localhost".to_string(), 5432, String::new(), String::new()),
    };

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        InventoryError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        InventoryError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        InventoryError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        InventoryError::connection(format!("Connection to {host}:{port} timed out."))
    } else {
        InventoryError::connection(error.to_string())
    }
}

/// Formats a query error with detail and hint if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
