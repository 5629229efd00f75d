//! Storage seam for hits and daily rollups.
//!
//! Implementations must scope every call to one site and must not retry;
//! callers own retry policy.

mod memory;

pub use memory::{like_match, MemoryStore};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hit::{Hit, RefScheme};
use crate::period::DateRange;

/// Hits recorded for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCount {
    pub path: String,
    pub count: u64,
}

/// Hits recorded for one referrer label of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefCount {
    #[serde(rename = "ref")]
    pub referrer: String,
    pub count: u64,
    pub ref_scheme: Option<RefScheme>,
}

/// One `hit_stats` row, with `stats` still in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatRecord {
    pub path: String,
    pub day: NaiveDate,
    pub stats: String,
}

/// Persistence for the `hits` and `hit_stats` tables.
#[async_trait]
pub trait HitStore: Send + Sync {
    /// Persist one normalized hit.
    async fn insert_hit(&self, hit: &Hit) -> Result<()>;

    /// Every hit for the site, oldest first.
    async fn list_hits(&self, site: i64) -> Result<Vec<Hit>>;

    /// Hits per path in `range`, skipping `exclude`, ordered by count
    /// descending then path ascending, at most `limit` rows.
    async fn count_paths(
        &self,
        site: i64,
        range: &DateRange,
        exclude: &[String],
        limit: u32,
    ) -> Result<Vec<PathCount>>;

    /// Hits across all paths in `range`.
    async fn count_total(&self, site: i64, range: &DateRange) -> Result<u64>;

    /// Rollup rows whose day falls in `range`.
    async fn day_stats(&self, site: i64, range: &DateRange) -> Result<Vec<DayStatRecord>>;

    /// Hits per `(ref, ref_scheme)` for `path` (matched case-insensitively),
    /// ordered by count descending then label descending.
    async fn count_refs(
        &self,
        site: i64,
        path: &str,
        range: &DateRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RefCount>>;

    /// Distinct paths that have at least one rollup row.
    async fn stat_paths(&self, site: i64) -> Result<Vec<String>>;

    /// Hits per path for paths matching a LIKE `pattern`.
    async fn paths_like(&self, site: i64, pattern: &str) -> Result<Vec<PathCount>>;

    /// Delete hits and rollup rows for paths matching a LIKE `pattern`.
    async fn purge_paths(&self, site: i64, pattern: &str) -> Result<()>;
}
