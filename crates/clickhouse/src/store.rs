//! `HitStore` backed by ClickHouse.

use async_trait::async_trait;
use stats_core::{DateRange, DayStatRecord, Hit, HitStore, PathCount, RefCount, Result};

use crate::client::ClickHouseClient;
use crate::{insert, query};

#[async_trait]
impl HitStore for ClickHouseClient {
    async fn insert_hit(&self, hit: &Hit) -> Result<()> {
        insert::insert_hits(self, std::slice::from_ref(hit)).await?;
        Ok(())
    }

    async fn list_hits(&self, site: i64) -> Result<Vec<Hit>> {
        query::list_hits(self, site).await
    }

    async fn count_paths(
        &self,
        site: i64,
        range: &DateRange,
        exclude: &[String],
        limit: u32,
    ) -> Result<Vec<PathCount>> {
        query::count_paths(self, site, range, exclude, limit).await
    }

    async fn count_total(&self, site: i64, range: &DateRange) -> Result<u64> {
        query::count_total(self, site, range).await
    }

    async fn day_stats(&self, site: i64, range: &DateRange) -> Result<Vec<DayStatRecord>> {
        query::day_stats(self, site, range).await
    }

    async fn count_refs(
        &self,
        site: i64,
        path: &str,
        range: &DateRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RefCount>> {
        query::count_refs(self, site, path, range, limit, offset).await
    }

    async fn stat_paths(&self, site: i64) -> Result<Vec<String>> {
        query::stat_paths(self, site).await
    }

    async fn paths_like(&self, site: i64, pattern: &str) -> Result<Vec<PathCount>> {
        query::paths_like(self, site, pattern).await
    }

    async fn purge_paths(&self, site: i64, pattern: &str) -> Result<()> {
        query::purge_paths(self, site, pattern).await
    }
}
