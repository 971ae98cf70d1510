//! HTTP mapping for [`InventoryError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::InventoryError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl InventoryError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::FrontendNotBuilt => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if self.is_client_error() {
            match &self {
                Self::InvalidRequest(msg) => msg.clone(),
                other => other.to_string(),
            }
        } else {
            error!("{}: {}", self.category(), self);
            "Internal Server Error".to_string()
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
