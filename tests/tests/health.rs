//! ClickHouse health checks and schema setup.
//!
//! Requires Docker (or `HITSTATS_TEST_CLICKHOUSE_URL`); run with
//! `--ignored`.

use clickhouse_client::{check_connection, init_schema, ClickHouseClient, ClickHouseConfig};
use integration_tests::setup::ClickHouseContext;
use stats_core::Site;
use telemetry::{health, HealthStatus};

/// Both checks touch the process-wide health registry, so they run in one
/// test to keep their order fixed.
#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_check_connection_updates_registry() {
    let mut config = ClickHouseConfig::new("http://127.0.0.1:1");
    config.timeout_secs = 2;
    let unreachable = ClickHouseClient::new(config).unwrap();

    assert!(!check_connection(&unreachable).await);
    assert!(!health().clickhouse.is_healthy());
    assert!(health().clickhouse.message().is_some());
    assert_eq!(health().report().status, HealthStatus::Unhealthy);

    let ctx = ClickHouseContext::new(Site::default()).await;
    assert!(check_connection(&ctx.clickhouse).await);
    assert!(health().clickhouse.is_healthy());
    assert!(health().clickhouse.message().is_none());
    assert_eq!(health().report().status, HealthStatus::Healthy);
}

#[tokio::test]
#[ignore = "requires Docker for the ClickHouse testcontainer"]
async fn test_init_schema_is_idempotent() {
    let ctx = ClickHouseContext::new(Site::default()).await;
    init_schema(&ctx.clickhouse).await.unwrap();
    init_schema(&ctx.clickhouse).await.unwrap();
}
