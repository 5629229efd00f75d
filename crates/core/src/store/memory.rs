//! In-process `HitStore`, used by tests and for running without ClickHouse.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::{DayStatRecord, HitStore, PathCount, RefCount};
use crate::error::{DbErrorCode, Error, Result};
use crate::hit::{Hit, RefScheme};
use crate::period::DateRange;

#[derive(Debug, Clone)]
struct StatRow {
    site: i64,
    record: DayStatRecord,
}

/// Hits and rollup rows held in memory.
///
/// Clones share the same data, so a test can keep a handle while the
/// ingestor owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    hits: Arc<RwLock<Vec<Hit>>>,
    stats: Arc<RwLock<Vec<StatRow>>>,
    inserts: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rollup row, standing in for the background job that writes them.
    pub fn add_day_stat(&self, site: i64, path: &str, day: NaiveDate, buckets: &[(u32, u64)]) {
        let stats = serde_json::Value::from(
            buckets
                .iter()
                .map(|(b, c)| serde_json::json!([b, c]))
                .collect::<Vec<_>>(),
        )
        .to_string();
        self.add_raw_day_stat(site, path, day, stats);
    }

    /// Add a rollup row with an arbitrary `stats` payload.
    pub fn add_raw_day_stat(&self, site: i64, path: &str, day: NaiveDate, stats: impl Into<String>) {
        self.stats.write().push(StatRow {
            site,
            record: DayStatRecord {
                path: path.to_string(),
                day,
                stats: stats.into(),
            },
        });
    }

    /// Every stored hit, across sites.
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.read().clone()
    }

    /// Number of successful `insert_hit` calls.
    pub fn insert_count(&self) -> usize {
        *self.inserts.lock()
    }

    /// Make every call fail until reset.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn clear(&self) {
        self.hits.write().clear();
        self.stats.write().clear();
        *self.inserts.lock() = 0;
    }

    fn check(&self, code: DbErrorCode) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::database(code, "memory store unavailable"));
        }
        Ok(())
    }
}

/// Case-insensitive SQL `LIKE`: `%` matches any run of characters, `_`
/// exactly one.
pub fn like_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    // matched[j]: pattern[..i] matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut any = false;
                for j in 0..=text.len() {
                    any |= matched[j];
                    next[j] = any;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1] && text[j - 1] == *c;
                }
            }
        }
        matched = next;
    }
    matched[text.len()]
}

fn ranked(counts: HashMap<String, u64>) -> Vec<PathCount> {
    let mut rows: Vec<PathCount> = counts
        .into_iter()
        .map(|(path, count)| PathCount { path, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));
    rows
}

#[async_trait]
impl HitStore for MemoryStore {
    async fn insert_hit(&self, hit: &Hit) -> Result<()> {
        self.check(DbErrorCode::StoreFailed)?;
        self.hits.write().push(hit.clone());
        *self.inserts.lock() += 1;
        Ok(())
    }

    async fn list_hits(&self, site: i64) -> Result<Vec<Hit>> {
        self.check(DbErrorCode::QueryFailed)?;
        let mut hits: Vec<Hit> = self
            .hits
            .read()
            .iter()
            .filter(|h| h.site == site)
            .cloned()
            .collect();
        hits.sort_by_key(|h| h.created_at);
        Ok(hits)
    }

    async fn count_paths(
        &self,
        site: i64,
        range: &DateRange,
        exclude: &[String],
        limit: u32,
    ) -> Result<Vec<PathCount>> {
        self.check(DbErrorCode::QueryFailed)?;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for hit in self.hits.read().iter() {
            if hit.site == site && range.contains(hit.created_at) && !exclude.contains(&hit.path) {
                *counts.entry(hit.path.clone()).or_default() += 1;
            }
        }
        let mut rows = ranked(counts);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn count_total(&self, site: i64, range: &DateRange) -> Result<u64> {
        self.check(DbErrorCode::QueryFailed)?;
        let total = self
            .hits
            .read()
            .iter()
            .filter(|h| h.site == site && range.contains(h.created_at))
            .count();
        Ok(total as u64)
    }

    async fn day_stats(&self, site: i64, range: &DateRange) -> Result<Vec<DayStatRecord>> {
        self.check(DbErrorCode::QueryFailed)?;
        let mut rows: Vec<DayStatRecord> = self
            .stats
            .read()
            .iter()
            .filter(|r| r.site == site && range.contains_day(r.record.day))
            .map(|r| r.record.clone())
            .collect();
        rows.sort_by(|a, b| a.day.cmp(&b.day).then_with(|| a.path.cmp(&b.path)));
        Ok(rows)
    }

    async fn count_refs(
        &self,
        site: i64,
        path: &str,
        range: &DateRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<RefCount>> {
        self.check(DbErrorCode::QueryFailed)?;
        let path = path.to_lowercase();
        let mut counts: HashMap<(String, Option<RefScheme>), u64> = HashMap::new();
        for hit in self.hits.read().iter() {
            if hit.site == site && range.contains(hit.created_at) && hit.path.to_lowercase() == path {
                *counts
                    .entry((hit.referrer.clone(), hit.ref_scheme))
                    .or_default() += 1;
            }
        }

        let mut rows: Vec<RefCount> = counts
            .into_iter()
            .map(|((referrer, ref_scheme), count)| RefCount {
                referrer,
                count,
                ref_scheme,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.referrer.cmp(&a.referrer))
                .then_with(|| a.ref_scheme.map(|s| s.code()).cmp(&b.ref_scheme.map(|s| s.code())))
        });
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn stat_paths(&self, site: i64) -> Result<Vec<String>> {
        self.check(DbErrorCode::QueryFailed)?;
        let paths: BTreeSet<String> = self
            .stats
            .read()
            .iter()
            .filter(|r| r.site == site)
            .map(|r| r.record.path.clone())
            .collect();
        Ok(paths.into_iter().collect())
    }

    async fn paths_like(&self, site: i64, pattern: &str) -> Result<Vec<PathCount>> {
        self.check(DbErrorCode::QueryFailed)?;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for hit in self.hits.read().iter() {
            if hit.site == site && like_match(pattern, &hit.path) {
                *counts.entry(hit.path.clone()).or_default() += 1;
            }
        }
        Ok(ranked(counts))
    }

    async fn purge_paths(&self, site: i64, pattern: &str) -> Result<()> {
        self.check(DbErrorCode::StoreFailed)?;
        self.hits
            .write()
            .retain(|h| h.site != site || !like_match(pattern, &h.path));
        self.stats
            .write()
            .retain(|r| r.site != site || !like_match(pattern, &r.record.path));
        Ok(())
    }
}
