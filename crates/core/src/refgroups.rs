//! Static referrer grouping tables and the ordered predicate rules.
//!
//! Tables are built once on first use and never mutated.

use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::error;

use crate::canonical::CanonicalRef;
use crate::classify::Classification;

/// A label that many hosts or paths collapse into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub label: &'static str,
    /// Whether `label` is a synthetic name rather than a host or path.
    pub generated: bool,
}

impl Group {
    const fn generated(label: &'static str) -> Self {
        Self { label, generated: true }
    }

    const fn host(label: &'static str) -> Self {
        Self { label, generated: false }
    }
}

const HACKER_NEWS: Group = Group::generated("Hacker News");
const EMAIL: Group = Group::generated("Email");
const GOOGLE: Group = Group::generated("Google");
const REDDIT: Group = Group::host("www.reddit.com");
const FACEBOOK: Group = Group::host("www.facebook.com");
const LINKEDIN: Group = Group::host("www.linkedin.com");

/// Mobile, regional and alternate front-end hosts mapped to their main host.
static HOST_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("en.m.wikipedia.org", "en.wikipedia.org"),
        ("m.facebook.com", "www.facebook.com"),
        ("m.habr.com", "habr.com"),
        ("old.reddit.com", "www.reddit.com"),
        ("i.reddit.com", "www.reddit.com"),
        ("np.reddit.com", "www.reddit.com"),
        ("fr.reddit.com", "www.reddit.com"),
    ])
});

/// Groups keyed on the (aliased) host alone.
static HOST_GROUPS: LazyLock<HashMap<&'static str, Group>> = LazyLock::new(|| {
    HashMap::from([
        // HN sends `referrer: origin`, so only the host ever arrives.
        ("news.ycombinator.com", HACKER_NEWS),
        ("hn.algolia.com", HACKER_NEWS),
        ("hckrnews.com", HACKER_NEWS),
        ("hn.premii.com", HACKER_NEWS),
        ("com.stefandekanski.hackernews.free", HACKER_NEWS),
        ("io.github.hidroh.materialistic", HACKER_NEWS),
        ("hackerweb.app", HACKER_NEWS),
        ("quiethn.com", HACKER_NEWS),
        ("mail.google.com", EMAIL),
        ("com.google.android.gm", EMAIL),
        ("mail.yahoo.com", EMAIL),
        ("com.google.android.googlequicksearchbox", GOOGLE),
        ("com.andrewshu.android.reddit", REDDIT),
        ("com.laurencedawson.reddit_sync", REDDIT),
        ("com.laurencedawson.reddit_sync.dev", REDDIT),
        ("com.laurencedawson.reddit_sync.pro", REDDIT),
        ("m.facebook.com", FACEBOOK),
        ("l.facebook.com", FACEBOOK),
        ("lm.facebook.com", FACEBOOK),
        ("com.Slack", Group::generated("Slack Chat")),
        ("com.linkedin.android", LINKEDIN),
        ("org.fox.ttrss", Group::generated("RSS")),
        ("org.telegram.messenger", Group::generated("Telegram Messenger")),
    ])
});

/// Groups keyed on `host/path`, checked when no host group matched.
static PATH_GROUPS: LazyLock<HashMap<&'static str, Group>> = LazyLock::new(|| {
    HashMap::from([
        ("www.daemonology.net/hn-daily", HACKER_NEWS),
        ("www.linkedin.com/feed", LINKEDIN),
        ("getpocket.com/redirect", Group::host("getpocket.com")),
    ])
});

pub fn host_alias(host: &str) -> Option<&'static str> {
    HOST_ALIASES.get(host).copied()
}

pub fn host_group(host: &str) -> Option<Group> {
    HOST_GROUPS.get(host).copied()
}

pub fn path_group(key: &str) -> Option<Group> {
    PATH_GROUPS.get(key).copied()
}

/// Query keys removed from every referrer.
pub const TRACKING_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign", "utm_term"];

/// Reddit listing views that all point at the same subreddit.
pub const LISTING_HOST: &str = "www.reddit.com";
pub const LISTING_SUFFIXES: &[&str] = &["/top", "/new", ".compact"];

/// t.co appends this as its only parameter on AMP pages.
pub const SHORTLINK_HOST: &str = "t.co";
pub const SHORTLINK_MARKER: &str = "amp=1";

const FEEDLY_PRIVATE_PATHS: &[&str] = &["/i/latest", "/i/my", "/i/saved"];
const FEEDLY_PRIVATE_PREFIXES: &[&str] = &["/i/collection/", "/i/tag/", "/i/category/"];
const FEEDLY_SUBSCRIPTION: &str = "/i/subscription/feed%2F";

/// Predicate rules, evaluated in the order of [`RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// link.oreilly.com redirects carry a unique path per link.
    OreillyLinks,
    /// Every `www.google.<tld>` is "Google".
    GoogleSearch,
    /// lobste.rs listings, searches and tag pages; story pages (`/s/`) pass.
    LobstersListings,
    /// Feedly's private views, and feed URLs from subscription pages.
    Feedly,
}

/// Registration order; the first rule that matches wins.
pub const RULES: &[Rule] = &[
    Rule::OreillyLinks,
    Rule::GoogleSearch,
    Rule::LobstersListings,
    Rule::Feedly,
];

impl Rule {
    pub fn apply(&self, url: &CanonicalRef) -> Option<Classification> {
        match self {
            Self::OreillyLinks => {
                (url.host == "link.oreilly.com").then(|| Classification::stored("link.oreilly.com", false))
            }
            Self::GoogleSearch => url
                .host
                .starts_with("www.google.")
                .then(|| Classification::stored(GOOGLE.label, GOOGLE.generated)),
            Self::LobstersListings => (url.host == "lobste.rs" && !url.path.starts_with("/s/"))
                .then(|| Classification::stored("lobste.rs", false)),
            Self::Feedly => feedly(url),
        }
    }
}

fn feedly(url: &CanonicalRef) -> Option<Classification> {
    if !url.host.starts_with("feedly.com") {
        return None;
    }

    let path = url.path.as_str();
    if FEEDLY_PRIVATE_PATHS.contains(&path)
        || FEEDLY_PRIVATE_PREFIXES.iter().any(|p| path.starts_with(p))
    {
        return Some(Classification::stored("feedly.com", false));
    }

    let feed = path.strip_prefix(FEEDLY_SUBSCRIPTION)?;
    match percent_decode_str(feed).decode_utf8() {
        Ok(feed) => Some(Classification {
            label: feed.into_owned(),
            params: None,
            store: false,
            generated: false,
        }),
        Err(e) => {
            error!(path = %path, error = %e, "could not unescape feedly subscription");
            None
        }
    }
}
