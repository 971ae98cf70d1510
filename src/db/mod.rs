//! Warehouse access layer.
//!
//! Provides a trait-based interface for warehouse connections, allowing
//! different backends to be used interchangeably. Connections are opened per
//! request through a [`Connector`] and closed explicitly once the request is
//! done with them.

mod databricks;
pub mod dialect;
mod mock;
mod postgres;
mod sqlite;
mod types;

pub use databricks::DatabricksClient;
pub use dialect::Dialect;
pub use mock::{MockConnector, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Statement, Value};

use crate::config::WarehouseConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Supported warehouse backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Databricks,
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a configuration string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Databricks => "databricks",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "databricks" => Some(Self::Databricks),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the SQL dialect spoken by this backend.
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Databricks => Dialect::Databricks,
            Self::Postgres => Dialect::Postgres,
            Self::Sqlite => Dialect::Sqlite,
        }
    }

    /// Human-readable name, used in response titles.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Databricks => "Databricks",
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens a single-use warehouse connection for the configured backend.
///
/// This is the central factory function for warehouse connections.
pub async fn connect(config: &WarehouseConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Databricks => {
            let client = DatabricksClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for warehouse connections.
///
/// A connection is owned by one request at a time, so execution takes `&mut self`.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Returns the SQL dialect statements must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Executes a statement and returns its rows with column metadata.
    async fn execute_query(&mut self, statement: &Statement) -> Result<QueryResult>;

    /// Closes the connection. Further statements fail.
    async fn close(&mut self) -> Result<()>;
}

/// Opens connections on demand (the connection provider).
#[async_trait]
pub trait Connector: Send + Sync {
    /// Backend the opened connections talk to.
    fn backend(&self) -> DatabaseBackend;

    /// Opens a fresh connection.
    async fn open(&self) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector backed by the warehouse configuration loaded at startup.
#[derive(Debug, Clone)]
pub struct WarehouseConnector {
    config: WarehouseConfig,
}

impl WarehouseConnector {
    /// Creates a connector for the given configuration.
    pub fn new(config: WarehouseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for WarehouseConnector {
    fn backend(&self) -> DatabaseBackend {
        self.config.backend
    }

    async fn open(&self) -> Result<Box<dyn DatabaseClient>> {
        connect(&self.config).await
    }
}
