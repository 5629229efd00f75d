//! Test fixtures and hit generators.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use stats_core::{DateRange, HitInput};

/// Site id used by every fixture.
pub const SITE: i64 = 1;

/// Referrers covering each classification path.
pub const REFERRERS: &[&str] = &[
    "https://www.google.co.uk/search?q=x",
    "https://news.ycombinator.com/",
    "https://example.com/page?utm_source=x&ref=1",
    "https://en.m.wikipedia.org/wiki/Analytics",
    "https://old.reddit.com/r/rust/new",
    "android-app://com.google.android.gm",
    "",
];

/// Noon UTC on the given day of June 2020.
pub fn june(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, day, 12, 0, 0).unwrap()
}

pub fn june_day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, day).unwrap()
}

/// All of June 2020.
pub fn june_range() -> DateRange {
    DateRange::from_dates(june_day(1), june_day(30))
}

/// A hit on `path` from `referrer` on a day in June 2020.
pub fn hit(path: &str, referrer: &str, day: u32) -> HitInput {
    HitInput::new(SITE, path, referrer).at(june(day))
}

/// `n` hits on `path` without a referrer.
pub fn hits(path: &str, n: usize, day: u32) -> Vec<HitInput> {
    (0..n).map(|_| hit(path, "", day)).collect()
}

