//! Error types for the inventory server.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for inventory operations.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Warehouse connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, unexpected result shapes, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A statement was refused by the read-only guard.
    #[error("Statement rejected: {0}")]
    Rejected(String),

    /// Configuration errors (invalid config file, missing access token, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed client request (bad pagination parameters).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The static frontend bundle has not been built.
    #[error("Frontend not built. Please run 'npm run build' first.")]
    FrontendNotBuilt,

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InventoryError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a rejected-statement error with the given message.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid-request error with the given message.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Rejected(_) => "Rejected Statement",
            Self::Config(_) => "Configuration Error",
            Self::InvalidRequest(_) => "Invalid Request",
            Self::FrontendNotBuilt => "Frontend Missing",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the caller caused the error rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::FrontendNotBuilt)
    }
}

/// Result type alias using InventoryError.
pub type Result<T> = std::result::Result<T, InventoryError>;
