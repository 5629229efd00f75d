//! ClickHouse table schemas.
//!
//! - `site` is the tenant key and leads every sort key
//! - LowCardinality for the single-character scheme code
//! - DateTime64(3) for millisecond precision
//! - `hit_stats.stats` holds the rollup JSON exactly as the rollup job wrote it

/// SQL for creating the hits table.
///
/// One row per pageview, written once by the ingestor.
pub const CREATE_HITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS hits (
    site Int64,
    path String,

    -- Referrer
    ref String,
    ref_params Nullable(String),
    ref_original Nullable(String),
    ref_scheme LowCardinality(Nullable(String)),

    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (site, created_at, path)
SETTINGS index_granularity = 8192
"#;

/// SQL for creating the daily rollup table.
///
/// Written by the external rollup job; `stats` is a JSON array of
/// `[bucket, count]` pairs.
pub const CREATE_HIT_STATS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS hit_stats (
    site Int64,
    path String,
    day Date,
    stats String
)
ENGINE = ReplacingMergeTree()
PARTITION BY toYYYYMM(day)
ORDER BY (site, path, day)
"#;

/// SQL for creating the database.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS `{}`", database)
}

/// All table creation statements.
pub fn all_tables() -> Vec<&'static str> {
    vec![CREATE_HITS_TABLE, CREATE_HIT_STATS_TABLE]
}
