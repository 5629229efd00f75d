//! Referrer classification.
//!
//! Turns a raw Referer header into a stable, low-cardinality label. Steps run
//! in a fixed order and the first decisive one wins:
//!
//! 1. host aliasing (never decisive, only marks the URL changed)
//! 2. host group table
//! 3. host+path group table
//! 4. predicate rules, in [`RULES`] order
//! 5. listing-suffix trimming for reddit (never decisive)
//! 6. query handling: t.co AMP marker, then tracking-parameter removal

use url::form_urlencoded;
use url::Url;

use crate::canonical::{strip_scheme, CanonicalRef};
use crate::refgroups::{
    host_group, path_group, Group, LISTING_HOST, LISTING_SUFFIXES, RULES, SHORTLINK_HOST,
    SHORTLINK_MARKER, TRACKING_PARAMS,
};

/// Result of classifying one referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: String,
    /// Query parameters left after tracking keys were removed
    pub params: Option<String>,
    /// Keep the original referrer next to the label
    pub store: bool,
    /// `label` is a group name, not a host or path
    pub generated: bool,
}

impl Classification {
    /// A label with no params whose original referrer should be kept.
    pub(crate) fn stored(label: impl Into<String>, generated: bool) -> Self {
        Self {
            label: label.into(),
            params: None,
            store: true,
            generated,
        }
    }
}

impl From<Group> for Classification {
    fn from(group: Group) -> Self {
        Self::stored(group.label, group.generated)
    }
}

/// Classify `raw`, which parsed as `url`.
pub fn classify(raw: &str, url: &Url) -> Classification {
    let mut canon = CanonicalRef::new(raw, url);

    if let Some(group) = host_group(&canon.host) {
        return group.into();
    }
    if let Some(group) = path_group(&canon.group_key()) {
        return group.into();
    }
    if let Some(found) = RULES.iter().find_map(|rule| rule.apply(&canon)) {
        return found;
    }

    if canon.host == LISTING_HOST {
        if let Some(suffix) = LISTING_SUFFIXES.iter().find(|s| canon.path.ends_with(*s)) {
            canon = canon.trim_path_suffix(suffix);
        }
    }

    let query = match url.query() {
        None | Some("") => {
            return Classification {
                label: canon.label(),
                params: None,
                store: canon.changed,
                generated: false,
            }
        }
        Some(q) => q,
    };

    if canon.host == SHORTLINK_HOST && query == SHORTLINK_MARKER {
        let bare = strip_scheme(raw);
        let bare = bare.split_once('?').map_or(bare, |(before, _)| before);
        return Classification {
            label: bare.to_string(),
            params: None,
            store: false,
            generated: false,
        };
    }

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let total = pairs.len();
    let mut kept: Vec<(String, String)> = pairs
        .into_iter()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_str()))
        .collect();
    let store = canon.changed || kept.len() != total;

    if kept.is_empty() {
        return Classification {
            label: canon.label(),
            params: None,
            store,
            generated: false,
        };
    }

    kept.sort_by(|a, b| a.0.cmp(&b.0));
    let params = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(kept)
        .finish();

    Classification {
        label: canon.label(),
        params: Some(params),
        store,
        generated: false,
    }
}
