//! Read queries over `hits` and `hit_stats`.
//!
//! Time bounds are bound as epoch milliseconds and days as `YYYY-MM-DD`
//! strings, so no ClickHouse date types cross the wire.

use crate::client::ClickHouseClient;
use crate::insert::{HitRow, HIT_COLUMNS};
use chrono::NaiveDate;
use clickhouse::Row;
use serde::Deserialize;
use stats_core::{
    DateRange, DayStatRecord, DbErrorCode, Error, Hit, PathCount, RefCount, RefScheme, Result,
};

const DAY_FORMAT: &str = "%Y-%m-%d";
const IN_RANGE: &str = "created_at BETWEEN fromUnixTimestamp64Milli(toInt64(?), 'UTC') \
                        AND fromUnixTimestamp64Milli(toInt64(?), 'UTC')";

#[derive(Debug, Clone, Row, Deserialize)]
struct PathCountRow {
    path: String,
    count: u64,
}

impl From<PathCountRow> for PathCount {
    fn from(row: PathCountRow) -> Self {
        Self {
            path: row.path,
            count: row.count,
        }
    }
}

#[derive(Debug, Clone, Row, Deserialize)]
struct RefCountRow {
    #[serde(rename = "ref")]
    referrer: String,
    count: u64,
    ref_scheme: Option<String>,
}

#[derive(Debug, Clone, Row, Deserialize)]
struct DayStatRow {
    path: String,
    day: String,
    stats: String,
}

#[derive(Debug, Clone, Row, Deserialize)]
struct PathRow {
    path: String,
}

fn query_err(op: &str, e: clickhouse::error::Error) -> Error {
    Error::database(DbErrorCode::QueryFailed, format!("{}: {}", op, e))
}

fn day(d: NaiveDate) -> String {
    d.format(DAY_FORMAT).to_string()
}

/// Every hit for a site, oldest first.
pub async fn list_hits(client: &ClickHouseClient, site: i64) -> Result<Vec<Hit>> {
    let sql = format!(
        "SELECT {} FROM hits WHERE site = ? ORDER BY created_at ASC",
        HIT_COLUMNS
    );
    let rows: Vec<HitRow> = client
        .inner()
        .query(&sql)
        .bind(site)
        .fetch_all()
        .await
        .map_err(|e| query_err("list_hits", e))?;
    rows.into_iter().map(Hit::try_from).collect()
}

/// Hits per path in range, ordered by count then path.
pub async fn count_paths(
    client: &ClickHouseClient,
    site: i64,
    range: &DateRange,
    exclude: &[String],
    limit: u32,
) -> Result<Vec<PathCount>> {
    let exclude_clause = if exclude.is_empty() {
        ""
    } else {
        "AND NOT has(?, path)"
    };
    let sql = format!(
        "SELECT path, count() AS count FROM hits \
         WHERE site = ? AND {} {} \
         GROUP BY path ORDER BY count DESC, path ASC LIMIT ?",
        IN_RANGE, exclude_clause
    );

    let mut query = client
        .inner()
        .query(&sql)
        .bind(site)
        .bind(range.start().timestamp_millis())
        .bind(range.end().timestamp_millis());
    if !exclude.is_empty() {
        query = query.bind(exclude);
    }

    let rows: Vec<PathCountRow> = query
        .bind(limit)
        .fetch_all()
        .await
        .map_err(|e| query_err("count_paths", e))?;
    Ok(rows.into_iter().map(PathCount::from).collect())
}

/// Hits in range across all paths.
pub async fn count_total(client: &ClickHouseClient, site: i64, range: &DateRange) -> Result<u64> {
    let sql = format!("SELECT count() FROM hits WHERE site = ? AND {}", IN_RANGE);
    client
        .inner()
        .query(&sql)
        .bind(site)
        .bind(range.start().timestamp_millis())
        .bind(range.end().timestamp_millis())
        .fetch_one::<u64>()
        .await
        .map_err(|e| query_err("count_total", e))
}

/// Rollup rows for days in range.
pub async fn day_stats(
    client: &ClickHouseClient,
    site: i64,
    range: &DateRange,
) -> Result<Vec<DayStatRecord>> {
    let rows: Vec<DayStatRow> = client
        .inner()
        .query(
            "SELECT path, toString(day) AS day, stats FROM hit_stats \
             WHERE site = ? AND day >= toDate(?) AND day <= toDate(?) \
             ORDER BY day ASC, path ASC",
        )
        .bind(site)
        .bind(day(range.start_day()))
        .bind(day(range.end_day()))
        .fetch_all()
        .await
        .map_err(|e| query_err("day_stats", e))?;

    rows.into_iter()
        .map(|row| {
            let day = NaiveDate::parse_from_str(&row.day, DAY_FORMAT)
                .map_err(|e| Error::decode(format!("hit_stats day {:?}: {}", row.day, e)))?;
            Ok(DayStatRecord {
                path: row.path,
                day,
                stats: row.stats,
            })
        })
        .collect()
}

/// Referrer counts for one path, matched case-insensitively.
pub async fn count_refs(
    client: &ClickHouseClient,
    site: i64,
    path: &str,
    range: &DateRange,
    limit: u32,
    offset: u32,
) -> Result<Vec<RefCount>> {
    let sql = format!(
        "SELECT ref, count() AS count, ref_scheme FROM hits \
         WHERE site = ? AND lower(path) = lower(?) AND {} \
         GROUP BY ref, ref_scheme \
         ORDER BY count DESC, ref DESC LIMIT ? OFFSET ?",
        IN_RANGE
    );
    let rows: Vec<RefCountRow> = client
        .inner()
        .query(&sql)
        .bind(site)
        .bind(path)
        .bind(range.start().timestamp_millis())
        .bind(range.end().timestamp_millis())
        .bind(limit)
        .bind(offset)
        .fetch_all()
        .await
        .map_err(|e| query_err("count_refs", e))?;

    Ok(rows
        .into_iter()
        .map(|row| RefCount {
            referrer: row.referrer,
            count: row.count,
            ref_scheme: row.ref_scheme.as_deref().and_then(RefScheme::from_code),
        })
        .collect())
}

/// Distinct paths with rollup rows.
pub async fn stat_paths(client: &ClickHouseClient, site: i64) -> Result<Vec<String>> {
    let rows: Vec<PathRow> = client
        .inner()
        .query("SELECT DISTINCT path FROM hit_stats WHERE site = ? ORDER BY path ASC")
        .bind(site)
        .fetch_all()
        .await
        .map_err(|e| query_err("stat_paths", e))?;
    Ok(rows.into_iter().map(|r| r.path).collect())
}

/// Hits per path for paths matching a LIKE pattern, case-insensitively.
pub async fn paths_like(client: &ClickHouseClient, site: i64, pattern: &str) -> Result<Vec<PathCount>> {
    let rows: Vec<PathCountRow> = client
        .inner()
        .query(
            "SELECT path, count() AS count FROM hits \
             WHERE site = ? AND lower(path) LIKE lower(?) \
             GROUP BY path ORDER BY count DESC, path ASC",
        )
        .bind(site)
        .bind(pattern)
        .fetch_all()
        .await
        .map_err(|e| query_err("paths_like", e))?;
    Ok(rows.into_iter().map(PathCount::from).collect())
}

/// Delete hits and rollup rows for matching paths, waiting for the mutation.
pub async fn purge_paths(client: &ClickHouseClient, site: i64, pattern: &str) -> Result<()> {
    let sync = client.inner().clone().with_option("mutations_sync", "1");
    for table in ["hits", "hit_stats"] {
        sync.query(&format!(
            "ALTER TABLE {} DELETE WHERE site = ? AND lower(path) LIKE lower(?)",
            table
        ))
        .bind(site)
        .bind(pattern)
        .execute()
        .await
        .map_err(|e| Error::database(DbErrorCode::StoreFailed, format!("purge {}: {}", table, e)))?;
    }
    Ok(())
}

/// Truncate both tables (test cleanup).
pub async fn truncate_all(client: &ClickHouseClient) -> Result<()> {
    for table in ["hits", "hit_stats"] {
        client
            .inner()
            .query(&format!("TRUNCATE TABLE IF EXISTS {}", table))
            .execute()
            .await
            .map_err(|e| Error::database(DbErrorCode::StoreFailed, format!("truncate {}: {}", table, e)))?;
    }
    Ok(())
}
