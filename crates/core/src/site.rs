//! Site identity and per-site query settings.

use serde::{Deserialize, Serialize};

use crate::limits::{DEFAULT_PAGE_LIMIT, DEFAULT_REF_LIMIT};

/// Page-size limits; `0` means "use the default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub page: u32,
    #[serde(default, alias = "ref")]
    pub refs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub limits: Limits,
}

/// The site a query or ingest call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    #[serde(default)]
    pub settings: SiteSettings,
}

impl Site {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            settings: SiteSettings::default(),
        }
    }

    pub fn with_limits(mut self, page: u32, refs: u32) -> Self {
        self.settings.limits = Limits { page, refs };
        self
    }

    /// Rows per path-stats page.
    pub fn page_limit(&self) -> u32 {
        match self.settings.limits.page {
            0 => DEFAULT_PAGE_LIMIT,
            n => n,
        }
    }

    /// Rows per referrer page.
    pub fn ref_limit(&self) -> u32 {
        match self.settings.limits.refs {
            0 => DEFAULT_REF_LIMIT,
            n => n,
        }
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new(1)
    }
}
