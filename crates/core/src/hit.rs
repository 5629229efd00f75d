//! Pageview hit types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// How a stored referrer label was produced (`ref_scheme` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefScheme {
    /// Referrer was an `http` or `https` URL.
    #[serde(rename = "h")]
    Http,
    /// Referrer used some other scheme (`android-app://`, ...).
    #[serde(rename = "o")]
    Other,
    /// Label is a synthetic group name such as "Hacker News".
    #[serde(rename = "g")]
    Generated,
}

impl RefScheme {
    /// Single-character storage code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http => "h",
            Self::Other => "o",
            Self::Generated => "g",
        }
    }

    /// Parse a storage code; unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "h" => Some(Self::Http),
            "o" => Some(Self::Other),
            "g" => Some(Self::Generated),
            _ => None,
        }
    }
}

/// A hit as received from the tracking endpoint, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct HitInput {
    /// Site the hit belongs to
    #[serde(default)]
    #[validate(range(min = 1))]
    pub site: i64,
    /// Page path, in any slash form
    #[serde(default, alias = "p")]
    #[validate(length(min = 1))]
    pub path: String,
    /// Raw Referer header value
    #[serde(default, rename = "ref", alias = "r")]
    pub referrer: String,
    /// Client-supplied time; ingestion time when absent
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl HitInput {
    pub fn new(site: i64, path: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self {
            site,
            path: path.into(),
            referrer: referrer.into(),
            created_at: None,
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// A normalized pageview, as persisted in the `hits` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub site: i64,
    /// Always starts with exactly one `/` and has no trailing `/` (root is `/`)
    pub path: String,
    /// Cleaned referrer label
    #[serde(rename = "ref")]
    pub referrer: String,
    /// Query parameters left over after removing tracking keys
    pub ref_params: Option<String>,
    /// Referrer before cleaning, kept only when cleaning changed it
    pub ref_original: Option<String>,
    pub ref_scheme: Option<RefScheme>,
    pub created_at: DateTime<Utc>,
}
