//! SQLite warehouse client.
//!
//! Implements `DatabaseClient` over a single sqlx SQLite connection, for local
//! development against an exported inventory snapshot.

use crate::config::WarehouseConfig;
use crate::db::{ColumnInfo, DatabaseClient, Dialect, QueryResult, Row, Statement, Value};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as SqlxColumn, ConnectOptions, Connection, Row as SqlxRow, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

/// SQLite client holding one connection.
#[derive(Debug)]
pub struct SqliteClient {
    conn: Option<SqliteConnection>,
}

impl SqliteClient {
    /// Opens the database named by `warehouse.url` (e.g. `sqlite:inventory.db`).
    ///
    /// The file is opened read-only and must already exist.
    pub async fn connect(config: &WarehouseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| InventoryError::config("DATABASE_URL is not set"))?;

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| InventoryError::config(format!("Invalid SQLite URL '{url}': {e}")))?
            .read_only(true)
            .create_if_missing(false);

        let conn = options
            .connect()
            .await
            .map_err(|e| InventoryError::connection(format!("Cannot open {url}: {e}")))?;

        debug!("Opened SQLite connection to {}", url);
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
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
            .map_err(|e| InventoryError::query(e.to_string()))?;

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
            debug!("Closed SQLite connection");
        }
        Ok(())
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// SQLite is dynamically typed, so the storage class of the value decides the
/// conversion. Only declared BOOLEAN columns are mapped from their 0/1 integers.
fn convert_value(row: &SqliteRow, index: usize, declared_type: &str) -> Value {
    let storage = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(e) => {
            debug!("Cannot read {} column {}: {}", declared_type, index, e);
            return Value::Null;
        }
    };

    if declared_type.eq_ignore_ascii_case("BOOLEAN") {
        if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(index) {
            return Value::Bool(b);
        }
    }

    let value = match storage.as_str() {
        "INTEGER" => row.try_get::<Option<i64>, _>(index).ok().flatten().map(Value::Int),
        "REAL" => row.try_get::<Option<f64>, _>(index).ok().flatten().map(Value::Float),
        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String),
    };

    value.unwrap_or(Value::Null)
}
