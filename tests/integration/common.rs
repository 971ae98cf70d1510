//! Shared helpers for driving the router in tests.

use asset_inventory::config::Config;
use asset_inventory::db::Connector;
use asset_inventory::http::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

/// Builds application state around an arbitrary connector.
pub fn state_with<C: Connector + 'static>(config: Config, connector: C) -> AppState {
    AppState::new(config, Arc::new(connector))
}

/// Sends a GET request and returns the status and raw body.
pub async fn get_raw(state: AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

/// Sends a GET request and parses the body as JSON.
pub async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get_raw(state, uri).await;
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("body of {uri} is not JSON ({e}): {}", String::from_utf8_lossy(&body)));
    (status, json)
}

/// Builds `/api/data` with properly encoded query parameters.
pub fn data_uri(params: &[(&str, &str)]) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    format!("/api/data?{}", query.finish())
}
