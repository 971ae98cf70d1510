//! Mock warehouse for testing.
//!
//! Provides an in-memory connector whose connections answer statements through
//! a caller-supplied handler and record everything they were asked to run.

use super::{Connector, DatabaseBackend, DatabaseClient, Dialect, QueryResult, Statement};
use crate::error::{InventoryError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Handler = Arc<dyn Fn(&Statement) -> Result<QueryResult> + Send + Sync>;

/// Shared bookkeeping between a connector and the connections it opened.
#[derive(Default)]
struct Journal {
    statements: Mutex<Vec<Statement>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// A connector that hands out [`MockDatabaseClient`]s.
#[derive(Clone)]
pub struct MockConnector {
    backend: DatabaseBackend,
    handler: Handler,
    open_error: Option<String>,
    journal: Arc<Journal>,
}

impl MockConnector {
    /// Creates a connector whose connections answer every statement with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Statement) -> Result<QueryResult> + Send + Sync + 'static,
    {
        Self {
            backend: DatabaseBackend::Databricks,
            handler: Arc::new(handler),
            open_error: None,
            journal: Arc::default(),
        }
    }

    /// Creates a connector whose connections return an empty result for every statement.
    pub fn empty() -> Self {
        Self::new(|_| Ok(QueryResult::new()))
    }

    /// Pretends to be a different backend (changes the rendered dialect).
    pub fn with_backend(mut self, backend: DatabaseBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Makes every `open` fail with a connection error.
    pub fn failing_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Statements executed so far, across all connections, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.journal
            .statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of connections opened.
    pub fn opened(&self) -> usize {
        self.journal.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed.
    pub fn closed(&self) -> usize {
        self.journal.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn open(&self) -> Result<Box<dyn DatabaseClient>> {
        if let Some(message) = &self.open_error {
            return Err(InventoryError::connection(message.clone()));
        }
        self.journal.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDatabaseClient {
            dialect: self.backend.dialect(),
            handler: Arc::clone(&self.handler),
            journal: Arc::clone(&self.journal),
            closed: false,
        }))
    }
}

/// A connection returned by [`MockConnector`].
pub struct MockDatabaseClient {
    dialect: Dialect,
    handler: Handler,
    journal: Arc<Journal>,
    closed: bool,
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute_query(&mut self, statement: &Statement) -> Result<QueryResult> {
        if self.closed {
            return Err(InventoryError::connection("Connection is closed"));
        }
        if let Ok(mut statements) = self.journal.statements.lock() {
            statements.push(statement.clone());
        }
        (self.handler)(statement)
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.journal.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
