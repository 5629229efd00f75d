//! Referrer spam hosts whose hits are dropped before storage.

use std::collections::HashSet;

/// Referrer-spam domains that never send real visitors.
const BUILTIN: &[&str] = &[
    "100dollars-seo.com",
    "best-seo-offer.com",
    "buttons-for-website.com",
    "buttons-for-your-website.com",
    "darodar.com",
    "econom.co",
    "get-free-traffic-now.com",
    "hulfingtonpost.com",
    "ilovevitaly.com",
    "priceg.com",
    "savetubevideo.com",
    "semalt.com",
    "sitevaluation.org",
    "social-buttons.com",
];

#[derive(Debug, Clone)]
pub struct Blacklist {
    hosts: HashSet<String>,
}

impl Blacklist {
    /// The built-in hosts plus `extra`. Entries are matched case-insensitively.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = BUILTIN
            .iter()
            .map(|h| h.to_string())
            .chain(
                extra
                    .into_iter()
                    .map(|h| h.as_ref().trim().to_ascii_lowercase())
                    .filter(|h| !h.is_empty()),
            )
            .collect();
        Self { hosts }
    }

    /// A list with no entries at all.
    pub fn empty() -> Self {
        Self {
            hosts: HashSet::new(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}
