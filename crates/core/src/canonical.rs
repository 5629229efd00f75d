//! URL canonicalization: scheme stripping and host aliasing.

use url::Url;

use crate::refgroups::host_alias;

/// Working copy of a referrer URL while it is being classified.
///
/// `changed` records whether canonicalization altered the URL, in which case
/// the original referrer must be kept alongside the cleaned label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRef {
    /// Host, including a non-default port
    pub host: String,
    /// Path as it appears in the URL (percent-encoded)
    pub path: String,
    pub changed: bool,
}

impl CanonicalRef {
    /// Canonical form of `raw`, which parsed as `url`.
    ///
    /// Anything the URL parser rewrote (host case, dot segments, a fragment)
    /// counts as a change, so the original referrer is kept.
    pub fn new(raw: &str, url: &Url) -> Self {
        let mut canon = Self::from_url(url);
        let written = written_label(raw, url);
        if url.fragment().is_some()
            || canon.label().trim_end_matches('/') != written.trim_end_matches('/')
        {
            canon.changed = true;
        }
        canon
    }

    /// Drop the scheme, then replace the host with its alias if it has one.
    pub fn from_url(url: &Url) -> Self {
        let mut host = url.host_str().unwrap_or_default().to_string();
        if let Some(port) = url.port() {
            host = format!("{}:{}", host, port);
        }

        let mut canon = Self {
            host,
            path: url.path().to_string(),
            changed: false,
        };

        if let Some(alias) = host_alias(&canon.host) {
            canon.host = alias.to_string();
            canon.changed = true;
        }

        canon
    }

    /// `host/path` with empty segments and the trailing slash removed; the
    /// key for host+path group lookups.
    pub fn group_key(&self) -> String {
        std::iter::once(self.host.as_str())
            .chain(self.path.split('/'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Host and path without scheme or query.
    pub fn label(&self) -> String {
        format!("{}{}", self.host, self.path)
            .trim_start_matches('/')
            .to_string()
    }

    /// Remove `suffix` from the end of the path, marking the URL changed.
    pub fn trim_path_suffix(mut self, suffix: &str) -> Self {
        if let Some(trimmed) = self.path.strip_suffix(suffix) {
            self.path = trimmed.to_string();
            self.changed = true;
        }
        self
    }
}

/// Host and path of `raw` as written: no scheme, query or fragment.
fn written_label<'a>(raw: &'a str, url: &Url) -> &'a str {
    let rest = raw.get(url.scheme().len()..).unwrap_or(raw);
    let rest = rest
        .strip_prefix("://")
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    rest.split(['?', '#']).next().unwrap_or(rest)
}

/// Strip a `scheme://` prefix from a raw referrer string.
///
/// Only schemes short enough to end within the first 7 characters are
/// recognised, which covers `http://` and `https://`.
pub fn strip_scheme(raw: &str) -> &str {
    match raw.find(':') {
        Some(p) if p < 7 && raw[p..].starts_with("://") => &raw[p + 3..],
        _ => raw,
    }
}
