//! Databricks client tests against a mocked Statement Execution API.

use super::common::{get_json, state_with};
use asset_inventory::config::{Config, WarehouseConfig};
use asset_inventory::db::{
    DatabaseBackend, DatabaseClient, DatabricksClient, Statement, Value, WarehouseConnector,
};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATEMENTS: &str = "/api/2.0/sql/statements/";

fn warehouse_config(server: &MockServer) -> WarehouseConfig {
    WarehouseConfig {
        backend: DatabaseBackend::Databricks,
        hostname: Some(server.uri()),
        http_path: Some("/sql/1.0/warehouses/wh-42".to_string()),
        access_token: Some("dapi-test".to_string()),
        ..Default::default()
    }
}

async fn client_for(server: &MockServer) -> DatabricksClient {
    DatabricksClient::connect(&warehouse_config(server))
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
}

fn manifest(columns: &[(&str, &str)]) -> serde_json::Value {
    let columns: Vec<_> = columns
        .iter()
        .enumerate()
        .map(|(i, (name, type_name))| json!({"name": name, "type_name": type_name, "position": i}))
        .collect();
    json!({"format": "JSON_ARRAY", "schema": {"column_count": columns.len(), "columns": columns}})
}

#[tokio::test]
async fn test_inline_result_is_typed_from_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STATEMENTS))
        .and(header("authorization", "Bearer dapi-test"))
        .and(body_partial_json(json!({
            "warehouse_id": "wh-42",
            "statement": "SELECT * FROM assets WHERE `provider` = :p0",
            "parameters": [{"name": "p0", "value": "aws", "type": "STRING"}],
            "disposition": "INLINE",
            "format": "JSON_ARRAY"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "st-1",
            "status": {"state": "SUCCEEDED"},
            "manifest": manifest(&[("id", "LONG"), ("name", "STRING"), ("cost", "DECIMAL"), ("public", "BOOLEAN")]),
            "result": {"data_array": [["1", "web-1", "12.50", "true"], ["2", null, "0.00", "false"]]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server).await;
    let statement = Statement::new("SELECT * FROM assets WHERE `provider` = :p0")
        .with_params(vec!["aws".to_string()]);
    let result = client.execute_query(&statement).await.unwrap();

    assert_eq!(result.columns.len(), 4);
    assert_eq!(result.columns[2].data_type, "DECIMAL");
    assert_eq!(
        result.rows,
        vec![
            vec![
                Value::Int(1),
                Value::from("web-1"),
                Value::Opaque("12.50".to_string()),
                Value::Bool(true),
            ],
            vec![
                Value::Int(2),
                Value::Null,
                Value::Opaque("0.00".to_string()),
                Value::Bool(false),
            ],
        ]
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_pending_statement_is_polled_and_chunks_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STATEMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "st-2",
            "status": {"state": "PENDING"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/2.0/sql/statements/st-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "st-2",
            "status": {"state": "SUCCEEDED"},
            "manifest": manifest(&[("total", "LONG")]),
            "result": {
                "chunk_index": 0,
                "data_array": [["10"]],
                "next_chunk_internal_link": "/api/2.0/sql/statements/st-2/result/chunks/1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/2.0/sql/statements/st-2/result/chunks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chunk_index": 1,
            "data_array": [["11"], ["12"]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server).await;
    let result = client
        .execute_query(&Statement::new("SELECT total FROM t"))
        .await
        .unwrap();

    assert_eq!(
        result.rows,
        vec![vec![Value::Int(10)], vec![Value::Int(11)], vec![Value::Int(12)]]
    );
    assert_eq!(result.row_count, 3);
}

#[tokio::test]
async fn test_failed_statement_is_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STATEMENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "st-3",
            "status": {
                "state": "FAILED",
                "error": {
                    "error_code": "BAD_REQUEST",
                    "message": "[TABLE_OR_VIEW_NOT_FOUND] The table cannot be found."
                }
            }
        })))
        .mount(&server)
        .await;

    let mut client = client_for(&server).await;
    let err = client
        .execute_query(&Statement::new("SELECT * FROM missing"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Query Error");
    assert!(err.to_string().contains("TABLE_OR_VIEW_NOT_FOUND"));
}

#[tokio::test]
async fn test_rejected_token_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STATEMENTS))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error_code": "PERMISSION_DENIED",
            "message": "Invalid access token."
        })))
        .mount(&server)
        .await;

    let mut client = client_for(&server).await;
    let err = client
        .execute_query(&Statement::new("SELECT 1"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Connection Error");
    assert!(err.to_string().contains("Invalid access token."));
}

#[tokio::test]
async fn test_classification_endpoint_over_databricks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STATEMENTS))
        .and(body_partial_json(json!({
            "statement": "SELECT resource_category, resource_type, total_count FROM cq_catalog.cloudquery.cloud_assets_counts"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statement_id": "st-4",
            "status": {"state": "SUCCEEDED"},
            "manifest": manifest(&[
                ("resource_category", "STRING"),
                ("resource_type", "STRING"),
                ("total_count", "LONG")
            ]),
            "result": {"data_array": [
                ["Compute", "aws_ec2_instances", "3"],
                ["Network", "aws_vpcs", "1"]
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.warehouse = warehouse_config(&server);
    let connector = WarehouseConnector::new(config.warehouse.clone());

    let (status, body) = get_json(state_with(config, connector), "/api/classification").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": [
                {
                    "resource_category": "Compute",
                    "total_count": 3,
                    "types": [{"resource_type": "aws_ec2_instances", "total_count": 3}]
                },
                {
                    "resource_category": "Network",
                    "total_count": 1,
                    "types": [{"resource_type": "aws_vpcs", "total_count": 1}]
                }
            ],
            "title": "Resource Classification in Databricks"
        })
    );
}
