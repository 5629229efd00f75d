//! Day-granularity date ranges for stats queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A closed range `[start, end]` covering whole UTC days.
///
/// `start` is always 00:00:00.000 of its day and `end` 23:59:59.999 of its
/// day, whatever timestamps the range was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_dates(start.date_naive(), end.date_naive())
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: day_start(start),
            end: day_start(end) + Duration::days(1) - Duration::milliseconds(1),
        }
    }

    /// Parse `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(start, DATE_FORMAT)
            .map_err(|e| Error::validation(format!("start date: {}", e)))?;
        let end = NaiveDate::parse_from_str(end, DATE_FORMAT)
            .map_err(|e| Error::validation(format!("end date: {}", e)))?;
        Ok(Self::from_dates(start, end))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        day >= self.start_day() && day <= self.end_day()
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Named dashboard periods, each ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    Day,
    /// Seven days back from today; lookbacks are not stacked on one another.
    #[default]
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
    All,
}

impl Period {
    /// Resolve to a range ending on the day of `now`.
    pub fn range_ending(&self, now: DateTime<Utc>) -> DateRange {
        let start = match self {
            Self::Day => now - Duration::days(1),
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
            Self::Quarter => now - Duration::days(91),
            Self::HalfYear => now - Duration::days(183),
            Self::Year => now - Duration::days(365),
            Self::All => DateTime::UNIX_EPOCH,
        };
        DateRange::new(start, now)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "half-year" => Ok(Self::HalfYear),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(Error::validation(format!("unknown period: {:?}", other))),
        }
    }
}
