//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use crate::schema::{all_tables, create_database};
use stats_core::{Error, Result};
use std::time::Duration;
use telemetry::health;
use tracing::{debug, error, info};

/// Check ClickHouse connection health and record it in the health registry.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    let timeout = Duration::from_secs(client.config().timeout_secs);
    let probe = client.inner().query("SELECT 1").fetch_one::<u8>();

    match tokio::time::timeout(timeout, probe).await {
        Ok(Ok(_)) => {
            debug!("ClickHouse connection healthy");
            health().clickhouse.set_healthy();
            true
        }
        Ok(Err(e)) => {
            error!("ClickHouse health check failed: {}", e);
            health().clickhouse.set_unhealthy(e.to_string());
            false
        }
        Err(_) => {
            error!(timeout_secs = timeout.as_secs(), "ClickHouse health check timed out");
            health().clickhouse.set_unhealthy("health check timed out");
            false
        }
    }
}

/// Initialize database schema.
///
/// Creates the configured database and both tables if they don't exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let database = &client.config().database;
    client
        .server()
        .query(&create_database(database))
        .execute()
        .await
        .map_err(|e| Error::internal(format!("Schema init error: {}", e)))?;

    for ddl in all_tables() {
        client
            .inner()
            .query(ddl)
            .execute()
            .await
            .map_err(|e| Error::internal(format!("Schema init error: {}", e)))?;
    }

    info!(database = %database, "ClickHouse schema initialized");
    Ok(())
}
