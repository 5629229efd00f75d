//! Hit ingestion: normalize, then a single store write.

use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, error, warn};

use crate::blacklist::Blacklist;
use crate::error::Result;
use crate::hit::{Hit, HitInput};
use crate::normalize::{normalize, Normalized};
use crate::store::HitStore;

/// What happened to one ingested hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored(Hit),
    /// Blacklisted referrer host; nothing was written.
    Dropped { host: String },
}

impl IngestOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// Write boundary for new hits.
pub struct HitIngestor<S: HitStore + ?Sized> {
    store: Arc<S>,
    blacklist: Blacklist,
}

impl<S: HitStore + ?Sized> HitIngestor<S> {
    pub fn new(store: Arc<S>, blacklist: Blacklist) -> Self {
        Self { store, blacklist }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Normalize `input` and store it.
    ///
    /// Validation and storage failures are returned with `ingest` context and
    /// nothing is written for them. Storage is not retried.
    pub async fn ingest(&self, input: HitInput) -> Result<IngestOutcome> {
        let start = Instant::now();
        metrics().hits_received.inc();

        let hit = match normalize(input, &self.blacklist) {
            Ok(Normalized::Hit(hit)) => hit,
            Ok(Normalized::Blacklisted { host }) => {
                metrics().hits_blacklisted.inc();
                debug!(host = %host, "dropped hit from blacklisted referrer");
                return Ok(IngestOutcome::Dropped { host });
            }
            Err(e) => {
                if e.is_validation() {
                    metrics().hits_failed_validation.inc();
                }
                warn!(error = %e, "rejected hit");
                return Err(e.context("ingest"));
            }
        };

        if let Err(e) = self.store.insert_hit(&hit).await {
            metrics().store_errors.inc();
            error!(site = hit.site, path = %hit.path, error = %e, "failed to store hit");
            return Err(e.context("ingest"));
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        metrics().hits_stored.inc();
        metrics().insert_latency_ms.observe(latency_ms);
        debug!(
            site = hit.site,
            path = %hit.path,
            referrer = %hit.referrer,
            latency_ms = latency_ms,
            "hit stored"
        );

        Ok(IngestOutcome::Stored(hit))
    }
}
