//! Internal metrics collection.
//!
//! Lock-free counters and latency histograms kept in a process-wide
//! registry. Nothing is exported; the binary logs a snapshot on shutdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000];

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    /// Returns `(upper bound ms, count)` pairs.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for hit ingestion and stats queries.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion
    pub hits_received: Counter,
    pub hits_stored: Counter,
    pub hits_blacklisted: Counter,
    pub hits_failed_validation: Counter,
    pub ref_parse_failures: Counter,

    // Storage
    pub store_errors: Counter,
    pub insert_latency_ms: Histogram,

    // Stats
    pub stats_queries: Counter,
    pub stats_latency_ms: Histogram,
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub hits_received: u64,
    pub hits_stored: u64,
    pub hits_blacklisted: u64,
    pub hits_failed_validation: u64,
    pub ref_parse_failures: u64,
    pub store_errors: u64,
    pub insert_latency_mean_ms: f64,
    pub stats_queries: u64,
    pub stats_latency_mean_ms: f64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            hits_received: self.hits_received.get(),
            hits_stored: self.hits_stored.get(),
            hits_blacklisted: self.hits_blacklisted.get(),
            hits_failed_validation: self.hits_failed_validation.get(),
            ref_parse_failures: self.ref_parse_failures.get(),
            store_errors: self.store_errors.get(),
            insert_latency_mean_ms: self.insert_latency_ms.mean(),
            stats_queries: self.stats_queries.get(),
            stats_latency_mean_ms: self.stats_latency_ms.mean(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::default);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
