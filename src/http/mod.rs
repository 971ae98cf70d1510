//! HTTP surface of the inventory server.
//!
//! Builds the axum router for the JSON API and the frontend fallback, and runs
//! it with graceful shutdown on SIGINT/SIGTERM.

mod error;
mod frontend;
mod handlers;

pub use error::ErrorBody;
pub use handlers::{ClassificationResponse, DataParams, DataResponse, HealthResponse};

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db::Connector;
use crate::error::{InventoryError, Result};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub connector: Arc<dyn Connector>,
}

impl AppState {
    pub fn new(config: Config, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
        }
    }
}

/// Creates the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/classification", get(handlers::classification))
        .route("/api/data", get(handlers::data))
        .fallback(frontend::spa_fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `bind` and serves until a shutdown signal arrives.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| InventoryError::config(format!("Cannot bind {bind}: {e}")))?;

    let local = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| bind.to_string());
    info!("Listening on http://{}", local);
    info!("Warehouse: {}", state.config.warehouse.display_string());
    info!("Frontend bundle: {}", state.config.server.static_dir.display());

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| InventoryError::internal(format!("Server error: {e}")))?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
