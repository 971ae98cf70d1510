//! PostgreSQL integration tests.
//!
//! These tests require a running PostgreSQL database and are skipped unless
//! DATABASE_URL points at one. Each test recreates its own `inventory_it_*` schema.

use super::common::{data_uri, get_json, state_with};
use asset_inventory::config::Config;
use asset_inventory::db::{DatabaseBackend, WarehouseConnector};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::{Connection, Executor, PgConnection};

const SEED: &str = "DROP SCHEMA IF EXISTS inventory_it CASCADE;
    CREATE SCHEMA inventory_it;
    CREATE TABLE inventory_it.cloud_assets (id BIGINT, provider TEXT, name TEXT, vcpus INT);
    INSERT INTO inventory_it.cloud_assets VALUES
       (1, 'aws', 'web-1', 2), (2, 'aws', 'web-2', 4), (3, 'gcp', 'db-1', 8);
    CREATE TABLE inventory_it.typed_assets
       (id BIGINT, name TEXT, cost NUMERIC(10,2), seen_at TIMESTAMPTZ, cq_id UUID);
    INSERT INTO inventory_it.typed_assets VALUES
       (1, 'vm-1', 12.50, '2024-05-01T10:00:00Z', '6f1c2a3e-8d4b-4f0a-9c2e-1b2d3e4f5a6b');
    CREATE TABLE inventory_it.cloud_assets_counts
       (resource_category TEXT, resource_type TEXT, total_count BIGINT);
    INSERT INTO inventory_it.cloud_assets_counts VALUES
       ('Compute', 'aws_ec2_instances', 2), ('Compute', 'gcp_compute_instances', 1);";

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| url.starts_with("postgres"))
}

/// Seeds `schema` and returns a config reading from it.
async fn seeded_config(schema: &str) -> Option<Config> {
    let url = get_test_database_url()?;
    let mut conn = PgConnection::connect(&url).await.ok()?;
    let seed = SEED.replace("inventory_it", schema);
    conn.execute(seed.as_str()).await.ok()?;
    conn.close().await.ok()?;

    let mut config = Config::default();
    config.warehouse.backend = DatabaseBackend::Postgres;
    config.warehouse.url = Some(url);
    config.tables.assets = format!("{schema}.cloud_assets");
    config.tables.counts = format!("{schema}.cloud_assets_counts");
    Some(config)
}

#[tokio::test]
async fn test_postgres_data_endpoint() {
    let Some(config) = seeded_config("inventory_it_data").await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let connector = WarehouseConnector::new(config.warehouse.clone());
    let uri = data_uri(&[
        (
            "filter",
            r#"[{"field":"vcpus","operator":"doesNotEqual","value":"8"}]"#,
        ),
        ("sorting", r#"[{"field":"id","sort":"desc"}]"#),
    ]);

    let (status, body) = get_json(state_with(config, connector), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 2);
    assert_eq!(body["title"], "cloud_assets from PostgreSQL");
    assert_eq!(
        body["data"],
        json!([
            {"id": 2, "provider": "aws", "name": "web-2", "vcpus": 4},
            {"id": 1, "provider": "aws", "name": "web-1", "vcpus": 2}
        ])
    );
}

#[tokio::test]
async fn test_postgres_classification_endpoint() {
    let Some(config) = seeded_config("inventory_it_classification").await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let connector = WarehouseConnector::new(config.warehouse.clone());

    let (status, body) = get_json(state_with(config, connector), "/api/classification").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["total_count"], 3);
    assert_eq!(body["data"][0]["types"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_postgres_non_primitive_columns_are_strings() {
    let Some(mut config) = seeded_config("inventory_it_typed").await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    config.tables.assets = "inventory_it_typed.typed_assets".to_string();
    let connector = WarehouseConnector::new(config.warehouse.clone());

    let (status, body) = get_json(state_with(config, connector), "/api/data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{
            "id": 1,
            "name": "vm-1",
            "cost": "12.50",
            "seen_at": "2024-05-01T10:00:00+00:00",
            "cq_id": "6f1c2a3e-8d4b-4f0a-9c2e-1b2d3e4f5a6b"
        }])
    );
}
