//! Read side: per-path and per-referrer statistics for one site.
//!
//! Path stats merge two sources that are read without a shared snapshot:
//! live counts from `hits` and per-day buckets from the `hit_stats` rollup.
//! The rollup lags behind live inserts, so `total` and `total_display` are
//! separate numbers and are expected to differ.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::hit::Hit;
use crate::limits::MIN_CHART_MAX;
use crate::period::DateRange;
use crate::site::Site;
use crate::store::{DayStatRecord, HitStore, PathCount, RefCount};

/// Rollup buckets for one path on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStat {
    pub day: NaiveDate,
    /// `(bucket, count)` pairs in rollup order
    pub buckets: Vec<(u32, u64)>,
}

/// One row of the top-paths listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStat {
    pub path: String,
    /// Live hits in range
    pub count: u64,
    /// Largest single bucket, never below `MIN_CHART_MAX`
    pub max: u64,
    pub stats: Vec<DayStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStatsPage {
    /// Live hits in range across all paths
    pub total: u64,
    /// Sum of rollup buckets attached to `rows`
    pub total_display: u64,
    pub more: bool,
    pub rows: Vec<PathStat>,
}

pub type ReferrerStat = RefCount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrersPage {
    pub more: bool,
    pub rows: Vec<ReferrerStat>,
}

/// Site-scoped stats queries.
pub struct HitStats<S: HitStore + ?Sized> {
    store: Arc<S>,
    site: Site,
}

impl<S: HitStore + ?Sized> HitStats<S> {
    pub fn new(store: Arc<S>, site: Site) -> Self {
        Self { store, site }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Top paths in `range`, with their rollup buckets.
    ///
    /// `more` is only computed when `exclude` is non-empty; it is the signal
    /// used to page through paths by excluding the ones already shown.
    pub async fn list_path_stats(
        &self,
        range: &DateRange,
        exclude: &[String],
    ) -> Result<PathStatsPage> {
        let site = self.site.id;
        let limit = self.site.page_limit();
        let query_limit = if exclude.is_empty() {
            limit
        } else {
            limit.saturating_add(1)
        };

        let mut counts = timed("list_path_stats", "count_paths", || {
            self.store.count_paths(site, range, exclude, query_limit)
        })
        .await?;
        let more = counts.len() > limit as usize;
        counts.truncate(limit as usize);

        let days = timed("list_path_stats", "day_stats", || {
            self.store.day_stats(site, range)
        })
        .await?;
        let (rows, total_display) =
            merge_day_stats(counts, &days).map_err(|e| e.context("list_path_stats"))?;

        let total = timed("list_path_stats", "count_total", || {
            self.store.count_total(site, range)
        })
        .await?;

        Ok(PathStatsPage {
            total,
            total_display,
            more,
            rows,
        })
    }

    /// Referrers for `path`, a page at a time.
    pub async fn list_referrers(
        &self,
        path: &str,
        range: &DateRange,
        offset: u32,
    ) -> Result<ReferrersPage> {
        let limit = self.site.ref_limit();
        let mut rows = timed("list_referrers", "count_refs", || {
            self.store
                .count_refs(self.site.id, path, range, limit.saturating_add(1), offset)
        })
        .await?;
        let more = rows.len() > limit as usize;
        rows.truncate(limit as usize);
        Ok(ReferrersPage { more, rows })
    }

    /// Paths that have rollup data.
    pub async fn list_paths(&self) -> Result<Vec<String>> {
        timed("list_paths", "stat_paths", || self.store.stat_paths(self.site.id)).await
    }

    /// Paths matching a LIKE `pattern`, with their hit counts.
    pub async fn list_paths_like(&self, pattern: &str) -> Result<Vec<PathCount>> {
        timed("list_paths_like", "paths_like", || {
            self.store.paths_like(self.site.id, pattern)
        })
        .await
    }

    /// Every hit for the site.
    pub async fn list_hits(&self) -> Result<Vec<Hit>> {
        timed("list_hits", "list_hits", || self.store.list_hits(self.site.id)).await
    }

    /// Delete hits and rollup rows for paths matching a LIKE `pattern`.
    pub async fn purge(&self, pattern: &str) -> Result<()> {
        if pattern.is_empty() {
            return Err(Error::validation("purge pattern is empty").context("purge"));
        }
        timed("purge", "purge_paths", || {
            self.store.purge_paths(self.site.id, pattern)
        })
        .await
    }
}

/// Attach each path's rollup days and compute the display totals.
fn merge_day_stats(counts: Vec<PathCount>, days: &[DayStatRecord]) -> Result<(Vec<PathStat>, u64)> {
    let mut total_display: u64 = 0;
    let mut rows = Vec::with_capacity(counts.len());

    for PathCount { path, count } in counts {
        let mut max: u64 = 0;
        let mut stats = Vec::new();
        for record in days.iter().filter(|d| d.path == path) {
            let buckets: Vec<(u32, u64)> = serde_json::from_str(&record.stats).map_err(|e| {
                Error::decode(format!("hit_stats {} {}: {}", record.path, record.day, e))
            })?;
            for &(_, n) in &buckets {
                total_display += n;
                max = max.max(n);
            }
            stats.push(DayStat {
                day: record.day,
                buckets,
            });
        }
        rows.push(PathStat {
            path,
            count,
            max: max.max(MIN_CHART_MAX),
            stats,
        });
    }

    Ok((rows, total_display))
}

async fn timed<T, F, Fut>(op: &'static str, query: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    metrics().stats_queries.inc();

    let result = f().await;
    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().stats_latency_ms.observe(latency_ms);

    match result {
        Ok(v) => {
            debug!(op = op, query = query, latency_ms = latency_ms, "stats query");
            Ok(v)
        }
        Err(e) => {
            error!(op = op, query = query, error = %e, "stats query failed");
            Err(e.context(op))
        }
    }
}
