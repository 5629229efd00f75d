//! Common test setup functions.

use chrono::NaiveDate;
use clickhouse_client::{init_schema, query::truncate_all, ClickHouseClient};
use stats_core::{Blacklist, HitIngestor, HitStats, MemoryStore, Result, Site};
use std::sync::Arc;

use crate::containers::ClickHouseServer;

/// Ingestor and stats reader over one in-memory store.
pub struct MemoryContext {
    pub store: MemoryStore,
    pub ingestor: HitIngestor<MemoryStore>,
    pub stats: HitStats<MemoryStore>,
}

impl MemoryContext {
    pub fn new(site: Site) -> Self {
        let store = MemoryStore::new();
        let shared = Arc::new(store.clone());
        Self {
            ingestor: HitIngestor::new(shared.clone(), Blacklist::default()),
            stats: HitStats::new(shared, site),
            store,
        }
    }
}

/// Ingestor and stats reader over a real ClickHouse with a fresh schema.
pub struct ClickHouseContext {
    pub server: ClickHouseServer,
    pub clickhouse: Arc<ClickHouseClient>,
    pub ingestor: HitIngestor<ClickHouseClient>,
    pub stats: HitStats<ClickHouseClient>,
}

impl ClickHouseContext {
    pub async fn new(site: Site) -> Self {
        let server = ClickHouseServer::start().await;

        let clickhouse = Arc::new(
            ClickHouseClient::new(server.config()).expect("Failed to create ClickHouse client"),
        );
        init_schema(&clickhouse)
            .await
            .expect("Failed to initialize schema");
        truncate_all(&clickhouse)
            .await
            .expect("Failed to truncate tables");

        Self {
            ingestor: HitIngestor::new(clickhouse.clone(), Blacklist::default()),
            stats: HitStats::new(clickhouse.clone(), site),
            clickhouse,
            server,
        }
    }

    /// Write a rollup row the way the rollup job would.
    pub async fn add_day_stat(
        &self,
        site: i64,
        path: &str,
        day: NaiveDate,
        buckets: &[(u32, u64)],
    ) -> Result<()> {
        let stats = serde_json::to_string(buckets)?;
        self.clickhouse
            .inner()
            .query("INSERT INTO hit_stats (site, path, day, stats) VALUES (?, ?, toDate(?), ?)")
            .bind(site)
            .bind(path)
            .bind(day.format("%Y-%m-%d").to_string())
            .bind(stats)
            .execute()
            .await
            .map_err(|e| stats_core::Error::internal(format!("seed hit_stats: {}", e)))
    }
}
