//! Single-page-application fallback.
//!
//! Files that exist in the bundle directory are served as-is. Every other path
//! gets `index.html` so the client-side router can handle it.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use super::AppState;
use crate::error::InventoryError;

/// Fallback handler for every path not matched by an API route.
pub async fn spa_fallback(State(state): State<AppState>, request: Request) -> Response {
    let static_dir = &state.config.server.static_dir;
    let index = static_dir.join("index.html");

    if !tokio::fs::try_exists(&index).await.unwrap_or(false) {
        return InventoryError::FrontendNotBuilt.into_response();
    }

    info!("Serving frontend for path: {}", request.uri().path());

    let service = ServeDir::new(static_dir).fallback(ServeFile::new(&index));
    match service.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
