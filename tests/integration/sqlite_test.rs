//! End-to-end tests against a SQLite inventory snapshot.

use super::common::{data_uri, get_json, state_with};
use asset_inventory::config::Config;
use asset_inventory::db::{Connector, DatabaseBackend, Statement, Value, WarehouseConnector};
use asset_inventory::http::AppState;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Executor};

const SCHEMA: &str = "
    CREATE TABLE cloud_assets (
        id INTEGER PRIMARY KEY,
        provider TEXT NOT NULL,
        name TEXT,
        region TEXT,
        monthly_cost REAL,
        public BOOLEAN
    );
    INSERT INTO cloud_assets VALUES (1, 'aws', 'web-1', 'eu-west-1', 12.5, 1);
    INSERT INTO cloud_assets VALUES (2, 'aws', 'db-1', 'us-east-1', 80.0, 0);
    INSERT INTO cloud_assets VALUES (3, 'gcp', 'web-2', 'europe-west1', NULL, 0);
    INSERT INTO cloud_assets VALUES (4, 'azure', 'o''brien-vm', 'westeurope', 3.25, NULL);

    CREATE TABLE cloud_assets_counts (
        resource_category TEXT,
        resource_type TEXT,
        total_count INTEGER
    );
    INSERT INTO cloud_assets_counts VALUES ('Compute', 'aws_ec2_instances', 3);
    INSERT INTO cloud_assets_counts VALUES ('Storage', 'aws_s3_buckets', 5);
    INSERT INTO cloud_assets_counts VALUES ('Compute', 'gcp_compute_instances', 2);
";

/// Creates a seeded database file and a config pointing at it.
async fn seeded_config() -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.db");

    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    conn.execute(SCHEMA).await.unwrap();
    conn.close().await.unwrap();

    let mut config = Config::default();
    config.warehouse.backend = DatabaseBackend::Sqlite;
    config.warehouse.url = Some(format!("sqlite:{}", path.display()));
    config.tables.assets = "main.cloud_assets".to_string();
    config.tables.counts = "main.cloud_assets_counts".to_string();
    config.validate().unwrap();
    (dir, config)
}

fn sqlite_state(config: Config) -> AppState {
    let connector = WarehouseConnector::new(config.warehouse.clone());
    state_with(config, connector)
}

#[tokio::test]
async fn test_classification_from_sqlite() {
    let (_dir, config) = seeded_config().await;
    let (status, body) = get_json(sqlite_state(config), "/api/classification").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Resource Classification in SQLite");
    assert_eq!(
        body["data"],
        json!([
            {
                "resource_category": "Compute",
                "total_count": 5,
                "types": [
                    {"resource_type": "aws_ec2_instances", "total_count": 3},
                    {"resource_type": "gcp_compute_instances", "total_count": 2}
                ]
            },
            {
                "resource_category": "Storage",
                "total_count": 5,
                "types": [{"resource_type": "aws_s3_buckets", "total_count": 5}]
            }
        ])
    );
}

#[tokio::test]
async fn test_data_filter_sort_and_page() {
    let (_dir, config) = seeded_config().await;
    let uri = data_uri(&[
        (
            "filter",
            r#"[{"field":"provider","operator":"doesNotEqual","value":"azure"}]"#,
        ),
        ("sorting", r#"[{"field":"id","sort":"desc"}]"#),
        ("page", "1"),
        ("pageSize", "2"),
    ]);
    let (status, body) = get_json(sqlite_state(config), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 3);
    assert_eq!(body["title"], "cloud_assets from SQLite");
    assert_eq!(
        body["data"],
        json!([{
            "id": 1,
            "provider": "aws",
            "name": "web-1",
            "region": "eu-west-1",
            "monthly_cost": 12.5,
            "public": true
        }])
    );
}

#[tokio::test]
async fn test_contains_filter_with_quote() {
    let (_dir, config) = seeded_config().await;
    let uri = data_uri(&[(
        "filter",
        r#"{"items":[{"field":"name","operator":"contains","value":"o'brien"}]}"#,
    )]);
    let (status, body) = get_json(sqlite_state(config), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 1);
    assert_eq!(body["data"][0]["name"], "o'brien-vm");
    assert_eq!(body["data"][0]["public"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_injection_value_matches_nothing() {
    let (_dir, config) = seeded_config().await;
    let uri = data_uri(&[(
        "filter",
        r#"[{"field":"provider","operator":"equals","value":"x' OR '1'='1"}]"#,
    )]);
    let (status, body) = get_json(sqlite_state(config), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_page_past_end_is_empty() {
    let (_dir, config) = seeded_config().await;
    let uri = data_uri(&[("page", "10"), ("pageSize", "25")]);
    let (status, body) = get_json(sqlite_state(config), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 4);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_unknown_column_is_server_error() {
    let (_dir, config) = seeded_config().await;
    let uri = data_uri(&[(
        "filter",
        r#"[{"field":"no_such_column","operator":"equals","value":"x"}]"#,
    )]);
    let (status, body) = get_json(sqlite_state(config), &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Internal Server Error");
}

#[tokio::test]
async fn test_connector_opens_fresh_connections() {
    let (_dir, config) = seeded_config().await;
    let connector = WarehouseConnector::new(config.warehouse.clone());

    let mut first = connector.open().await.unwrap();
    let mut second = connector.open().await.unwrap();
    first.close().await.unwrap();

    let result = second
        .execute_query(&Statement::new("SELECT COUNT(*) FROM cloud_assets"))
        .await
        .unwrap();
    assert_eq!(result.scalar(), Some(&Value::Int(4)));
    second.close().await.unwrap();
}
