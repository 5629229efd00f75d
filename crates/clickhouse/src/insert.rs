//! Hit rows and insert helpers for ClickHouse.

use crate::client::ClickHouseClient;
use chrono::DateTime;
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use stats_core::{DbErrorCode, Error, Hit, RefScheme, Result};
use tracing::debug;

/// Row layout of the `hits` table.
#[derive(Debug, Clone, PartialEq, Eq, Row, Serialize, Deserialize)]
pub struct HitRow {
    pub site: i64,
    pub path: String,
    #[serde(rename = "ref")]
    pub referrer: String,
    pub ref_params: Option<String>,
    pub ref_original: Option<String>,
    pub ref_scheme: Option<String>,
    pub created_at: i64, // DateTime64(3) as milliseconds
}

/// Column list matching [`HitRow`] field order.
pub const HIT_COLUMNS: &str = "site, path, ref, ref_params, ref_original, ref_scheme, created_at";

impl From<&Hit> for HitRow {
    fn from(hit: &Hit) -> Self {
        Self {
            site: hit.site,
            path: hit.path.clone(),
            referrer: hit.referrer.clone(),
            ref_params: hit.ref_params.clone(),
            ref_original: hit.ref_original.clone(),
            ref_scheme: hit.ref_scheme.map(|s| s.code().to_string()),
            created_at: hit.created_at.timestamp_millis(),
        }
    }
}

impl TryFrom<HitRow> for Hit {
    type Error = Error;

    fn try_from(row: HitRow) -> Result<Self> {
        let created_at = DateTime::from_timestamp_millis(row.created_at)
            .ok_or_else(|| Error::decode(format!("created_at out of range: {}", row.created_at)))?;
        let ref_scheme = match row.ref_scheme.as_deref() {
            None => None,
            Some(code) => Some(
                RefScheme::from_code(code)
                    .ok_or_else(|| Error::decode(format!("unknown ref_scheme: {:?}", code)))?,
            ),
        };

        Ok(Hit {
            site: row.site,
            path: row.path,
            referrer: row.referrer,
            ref_params: row.ref_params,
            ref_original: row.ref_original,
            ref_scheme,
            created_at,
        })
    }
}

fn store_err(stage: &str, e: clickhouse::error::Error) -> Error {
    Error::database(DbErrorCode::StoreFailed, format!("{} error: {}", stage, e))
}

/// Insert hits in one batch.
pub async fn insert_hits(client: &ClickHouseClient, hits: &[Hit]) -> Result<usize> {
    if hits.is_empty() {
        return Ok(0);
    }

    let count = hits.len();
    let start = std::time::Instant::now();

    let mut insert = client
        .inner()
        .insert("hits")
        .map_err(|e| store_err("Insert", e))?;

    for hit in hits {
        insert
            .write(&HitRow::from(hit))
            .await
            .map_err(|e| store_err("Write", e))?;
    }

    insert.end().await.map_err(|e| store_err("End", e))?;

    debug!(
        count = count,
        latency_ms = %start.elapsed().as_millis(),
        "Inserted hits to ClickHouse"
    );

    Ok(count)
}
