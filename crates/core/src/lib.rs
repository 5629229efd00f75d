//! Core of hitstats: referrer classification, hit ingestion and stats
//! aggregation over a pluggable [`HitStore`].

pub mod blacklist;
pub mod canonical;
pub mod classify;
pub mod error;
pub mod hit;
pub mod ingest;
pub mod limits;
pub mod normalize;
pub mod period;
pub mod refgroups;
pub mod site;
pub mod stats;
pub mod store;

pub use blacklist::Blacklist;
pub use classify::{classify, Classification};
pub use error::{DbErrorCode, Error, Result};
pub use hit::{Hit, HitInput, RefScheme};
pub use ingest::{HitIngestor, IngestOutcome};
pub use normalize::{normalize, normalize_path, Normalized};
pub use period::{DateRange, Period};
pub use site::{Limits, Site, SiteSettings};
pub use stats::{DayStat, HitStats, PathStat, PathStatsPage, ReferrerStat, ReferrersPage};
pub use store::{DayStatRecord, HitStore, MemoryStore, PathCount, RefCount};
