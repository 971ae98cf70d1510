//! Databricks SQL warehouse client.
//!
//! Talks to the SQL Statement Execution API (`/api/2.0/sql/statements`).
//! Results are requested inline in `JSON_ARRAY` format, where every cell is a
//! string; cells are typed afterwards from the manifest's column types.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::config::WarehouseConfig;
use crate::db::dialect::{parameter_name, Dialect};
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Statement, Value};
use crate::error::{InventoryError, Result};

/// Statement API path, relative to the workspace URL.
const STATEMENTS_PATH: &str = "api/2.0/sql/statements/";

/// Timeout for establishing the TCP/TLS connection to the workspace.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Delay between status polls for a statement that is still running.
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Bounds the API accepts for `wait_timeout` (seconds).
const MIN_WAIT_TIMEOUT_SECS: u64 = 5;
const MAX_WAIT_TIMEOUT_SECS: u64 = 50;

/// Databricks SQL warehouse client.
///
/// The statement API is stateless, so "opening" the connection validates the
/// credentials locally and prepares an HTTP client bound to one warehouse.
#[derive(Debug)]
pub struct DatabricksClient {
    client: Client,
    base_url: Url,
    warehouse_id: String,
    access_token: String,
    wait_timeout_secs: u64,
    poll_interval: Duration,
    closed: bool,
}

impl DatabricksClient {
    /// Creates a client for the configured warehouse.
    ///
    /// Fails with a configuration error when no access token was supplied.
    pub async fn connect(config: &WarehouseConfig) -> Result<Self> {
        let access_token = config.access_token()?.to_string();
        let base_url = config.base_url()?;
        let warehouse_id = config.warehouse_id()?.to_string();

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                InventoryError::connection(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!(
            "Opened Databricks connection to {} (warehouse {})",
            base_url, warehouse_id
        );

        Ok(Self {
            client,
            base_url,
            warehouse_id,
            access_token,
            wait_timeout_secs: config
                .wait_timeout_secs
                .clamp(MIN_WAIT_TIMEOUT_SECS, MAX_WAIT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            closed: false,
        })
    }

    /// Sets the delay between status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| InventoryError::internal(format!("Invalid API path '{path}': {e}")))
    }

    fn build_request(&self, statement: &Statement) -> StatementRequest {
        StatementRequest {
            warehouse_id: self.warehouse_id.clone(),
            statement: statement.sql.clone(),
            parameters: statement
                .params
                .iter()
                .enumerate()
                .map(|(i, value)| StatementParameter {
                    name: parameter_name(i),
                    value: value.clone(),
                    r#type: "STRING".to_string(),
                })
                .collect(),
            wait_timeout: format!("{}s", self.wait_timeout_secs),
            on_wait_timeout: "CONTINUE".to_string(),
            disposition: "INLINE".to_string(),
            format: "JSON_ARRAY".to_string(),
        }
    }

    /// Submits the statement and waits for a terminal state.
    async fn run_statement(&self, statement: &Statement) -> Result<StatementResponse> {
        let request = self.build_request(statement);
        let url = self.endpoint(STATEMENTS_PATH)?;

        let sent = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await;
        let mut response: StatementResponse = self.read_json(sent).await?;

        loop {
            match response.status.state {
                StatementState::Succeeded => return Ok(response),
                StatementState::Pending | StatementState::Running => {
                    debug!(
                        "Statement {} is {:?}, polling again in {:?}",
                        response.statement_id, response.status.state, self.poll_interval
                    );
                    tokio::time::sleep(self.poll_interval).await;
                    response = self.fetch_status(&response.statement_id).await?;
                }
                StatementState::Failed
                | StatementState::Canceled
                | StatementState::Closed
                | StatementState::Unknown => {
                    return Err(InventoryError::query(describe_failure(&response)));
                }
            }
        }
    }

    async fn fetch_status(&self, statement_id: &str) -> Result<StatementResponse> {
        let url = self.endpoint(&format!("{STATEMENTS_PATH}{statement_id}"))?;
        let sent = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await;
        self.read_json(sent).await
    }

    async fn fetch_chunk(&self, link: &str) -> Result<ResultChunk> {
        let url = self.endpoint(link)?;
        let sent = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await;
        self.read_json(sent).await
    }

    /// Reads a JSON body from an API response, mapping transport and HTTP errors.
    async fn read_json<T>(&self, sent: reqwest::Result<reqwest::Response>) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = sent.map_err(|e| self.map_request_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InventoryError::connection(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| InventoryError::query(format!("Failed to parse response: {e}")))
    }

    fn map_request_error(&self, error: reqwest::Error) -> InventoryError {
        let host = self.base_url.host_str().unwrap_or("workspace");
        if error.is_connect() {
            InventoryError::connection(format!(
                "Cannot connect to {host}. Check DATABRICKS_HOSTNAME and your network."
            ))
        } else if error.is_timeout() {
            InventoryError::connection(format!("Request to {host} timed out."))
        } else {
            InventoryError::connection(format!("Request failed: {error}"))
        }
    }
}

#[async_trait]
impl DatabaseClient for DatabricksClient {
    fn dialect(&self) -> Dialect {
        Dialect::Databricks
    }

    async fn execute_query(&mut self, statement: &Statement) -> Result<QueryResult> {
        if self.closed {
            return Err(InventoryError::connection("Connection is closed"));
        }

        let start = Instant::now();
        let response = self.run_statement(statement).await?;

        let columns: Vec<ColumnInfo> = response
            .manifest
            .as_ref()
            .and_then(|m| m.schema.as_ref())
            .map(|schema| {
                schema
                    .columns
                    .iter()
                    .map(|c| ColumnInfo::new(&c.name, c.type_name.as_deref().unwrap_or("STRING")))
                    .collect()
            })
            .unwrap_or_default();

        let mut raw_rows = Vec::new();
        let mut next_link = None;
        if let Some(chunk) = response.result {
            raw_rows.extend(chunk.data_array.unwrap_or_default());
            next_link = chunk.next_chunk_internal_link;
        }

        while let Some(link) = next_link {
            debug!("Fetching result chunk {}", link);
            let chunk = self.fetch_chunk(&link).await?;
            raw_rows.extend(chunk.data_array.unwrap_or_default());
            next_link = chunk.next_chunk_internal_link;
        }

        let rows: Vec<Row> = raw_rows
            .iter()
            .map(|cells| convert_row(cells, &columns))
            .collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            debug!("Closed Databricks connection to {}", self.base_url);
        }
        self.closed = true;
        Ok(())
    }
}

/// Converts one `JSON_ARRAY` row using the manifest column types.
fn convert_row(cells: &[serde_json::Value], columns: &[ColumnInfo]) -> Row {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let type_name = columns.get(i).map(|c| c.data_type.as_str()).unwrap_or("");
            convert_cell(cell, type_name)
        })
        .collect()
}

/// Converts a single cell to our Value type.
fn convert_cell(cell: &serde_json::Value, type_name: &str) -> Value {
    let text = match cell {
        serde_json::Value::Null => return Value::Null,
        serde_json::Value::String(s) => s.as_str(),
        // Nested JSON only shows up for complex types; keep it as text
        other => return Value::Opaque(other.to_string()),
    };

    let typed = match type_name.to_uppercase().as_str() {
        "BOOLEAN" => text.parse().ok().map(Value::Bool),
        "BYTE" | "SHORT" | "INT" | "LONG" => text.parse().ok().map(Value::Int),
        "FLOAT" | "DOUBLE" => text.parse().ok().map(Value::Float),
        "STRING" | "CHAR" | "VARCHAR" => Some(Value::String(text.to_string())),
        _ => None,
    };

    typed.unwrap_or_else(|| Value::Opaque(text.to_string()))
}

/// Parses an API error response.
fn parse_error(status: StatusCode, body: &str) -> InventoryError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return InventoryError::connection(format!(
            "Authentication failed. Check DATABRICKS_ACCESS_TOKEN. ({message})"
        ));
    }

    if status.is_server_error() || status == StatusCode::NOT_FOUND {
        warn!("Databricks API returned {}: {}", status, message);
        return InventoryError::connection(format!("Databricks API error ({status}): {message}"));
    }

    InventoryError::query(format!("Databricks API error ({status}): {message}"))
}

fn describe_failure(response: &StatementResponse) -> String {
    let state = format!("{:?}", response.status.state).to_uppercase();
    match &response.status.error {
        Some(ServiceError {
            error_code: Some(code),
            message: Some(message),
        }) => format!("Statement {state} [{code}]: {message}"),
        Some(ServiceError {
            message: Some(message),
            ..
        }) => format!("Statement {state}: {message}"),
        _ => format!("Statement {} ended in state {state}", response.statement_id),
    }
}

// Statement Execution API types

#[derive(Debug, Serialize)]
struct StatementRequest {
    warehouse_id: String,
    statement: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parameters: Vec<StatementParameter>,
    wait_timeout: String,
    on_wait_timeout: String,
    disposition: String,
    format: String,
}

#[derive(Debug, Serialize)]
struct StatementParameter {
    name: String,
    value: String,
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(default)]
    statement_id: String,
    status: StatementStatus,
    manifest: Option<Manifest>,
    result: Option<ResultChunk>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: StatementState,
    error: Option<ServiceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    schema: Option<ManifestSchema>,
}

#[derive(Debug, Deserialize)]
struct ManifestSchema {
    #[serde(default)]
    columns: Vec<ManifestColumn>,
}

#[derive(Debug, Deserialize)]
struct ManifestColumn {
    name: String,
    type_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultChunk {
    data_array: Option<Vec<Vec<serde_json::Value>>>,
    next_chunk_internal_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
}
