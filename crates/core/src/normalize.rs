//! Turns a raw [`HitInput`] into a storable [`Hit`].

use chrono::Utc;
use telemetry::metrics;
use tracing::warn;
use url::Url;
use validator::Validate;

use crate::blacklist::Blacklist;
use crate::classify::classify;
use crate::error::{Error, Result};
use crate::hit::{Hit, HitInput, RefScheme};

/// Outcome of normalizing one hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Hit(Hit),
    /// The referrer host is blacklisted; nothing should be written.
    Blacklisted { host: String },
}

/// Validate, default and classify `input`.
///
/// A blacklisted referrer host short-circuits everything else, including
/// validation.
///
/// A referrer that does not parse as a URL is not an error: it is kept as
/// given, unclassified and without a scheme.
pub fn normalize(input: HitInput, blacklist: &Blacklist) -> Result<Normalized> {
    let url = if input.referrer.is_empty() {
        None
    } else {
        match Url::parse(&input.referrer) {
            Ok(url) => Some(url),
            Err(e) => {
                metrics().ref_parse_failures.inc();
                warn!(
                    site = input.site,
                    referrer = %input.referrer,
                    error = %e,
                    "could not parse referrer"
                );
                None
            }
        }
    };

    if let Some(host) = url.as_ref().and_then(Url::host_str) {
        if blacklist.contains(host) {
            return Ok(Normalized::Blacklisted {
                host: host.to_string(),
            });
        }
    }

    input.validate().map_err(|e| Error::invalid_fields(&e))?;

    let mut hit = Hit {
        site: input.site,
        path: normalize_path(&input.path),
        referrer: String::new(),
        ref_params: None,
        ref_original: None,
        ref_scheme: None,
        created_at: input.created_at.unwrap_or_else(Utc::now),
    };

    let raw = input.referrer;
    if raw.is_empty() {
        return Ok(Normalized::Hit(hit));
    }
    let Some(url) = url else {
        hit.referrer = trim_trailing_slash(&raw).to_string();
        return Ok(Normalized::Hit(hit));
    };

    let class = classify(&raw, &url);
    hit.ref_scheme = Some(if class.generated {
        RefScheme::Generated
    } else if matches!(url.scheme(), "http" | "https") {
        RefScheme::Http
    } else {
        RefScheme::Other
    });
    hit.referrer = trim_trailing_slash(&class.label).to_string();
    hit.ref_params = class.params;
    if class.store {
        hit.ref_original = Some(raw);
    }

    Ok(Normalized::Hit(hit))
}

/// Exactly one leading slash and no trailing slash; the root is `/`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

fn trim_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}
