//! API route handlers.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::info;

use super::AppState;
use crate::error::Result;
use crate::query::{
    compose_order_by, compose_where, parse_filters, parse_sorting, ColumnPolicy, DataQuery,
    PageRequest, QueryExecutor,
};
use crate::shaping::{aggregate_classification, rows_to_json, CategorySummary};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub data: Vec<CategorySummary>,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: Vec<Map<String, JsonValue>>,
    #[serde(rename = "rowCount")]
    pub row_count: i64,
    pub title: String,
}

/// Raw query parameters of `/api/data`. Malformed filter or sort JSON is
/// ignored, not rejected.
#[derive(Debug, Default, PartialEq)]
pub struct DataParams {
    pub filter: Option<String>,
    pub sorting: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl DataParams {
    /// Picks the known keys out of a decoded query string. A repeated key
    /// keeps its last value; unknown keys are ignored.
    pub fn from_query(mut query: HashMap<String, String>) -> Self {
        Self {
            filter: query.remove("filter"),
            sorting: query.remove("sorting"),
            page: query.remove("page"),
            page_size: query.remove("pageSize"),
        }
    }
}

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    info!("Health check at /api/health");
    Json(HealthResponse { status: "healthy" })
}

/// `GET /api/classification`
pub async fn classification(State(state): State<AppState>) -> Result<Json<ClassificationResponse>> {
    let executor = QueryExecutor::new(state.connector.as_ref(), &state.config.tables);
    let result = executor.fetch_classification().await?;
    let data = aggregate_classification(&result)?;

    Ok(Json(ClassificationResponse {
        data,
        title: format!(
            "Resource Classification in {}",
            state.connector.backend().display_name()
        ),
    }))
}

/// `GET /api/data?filter=&sorting=&page=&pageSize=`
pub async fn data(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<DataResponse>> {
    let params = DataParams::from_query(query);
    let config = &state.config;
    let page = PageRequest::from_params(
        params.page.as_deref(),
        params.page_size.as_deref(),
        config.query.max_page_size,
    )?;

    let policy = ColumnPolicy::from_config(&config.query);
    let filters = parse_filters(params.filter.as_deref().unwrap_or(""));
    let sorts = parse_sorting(params.sorting.as_deref().unwrap_or(""));
    let query = DataQuery {
        filter: compose_where(&filters, &policy),
        order_by: compose_order_by(&sorts, &policy),
        page,
    };

    let executor = QueryExecutor::new(state.connector.as_ref(), &config.tables);
    let page = executor.fetch_page(&query).await?;

    Ok(Json(DataResponse {
        data: rows_to_json(&page.result),
        row_count: page.total,
        title: format!(
            "{} from {}",
            config.tables.assets_short_name(),
            state.connector.backend().display_name()
        ),
    }))
}
