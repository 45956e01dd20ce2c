//! Named history ranges and their retrieval windows

use crate::error::InvalidRangeError;
use chrono::{DateTime, Duration, Months, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named aggregation window
///
/// Selects both how far back samples are fetched and how the aggregator
/// groups them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Range {
    /// Last 24 hours, one point per sample
    Day,
    /// Last 7 days, grouped by weekday
    Week,
    /// Last calendar month, grouped by day of month
    Month,
    /// Last calendar year, grouped by month
    Year,
}

impl Range {
    /// Every range, in display order
    pub const ALL: [Range; 4] = [Range::Day, Range::Week, Range::Month, Range::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Range::Day => "day",
            Range::Week => "week",
            Range::Month => "month",
            Range::Year => "year",
        }
    }

    /// Start of the retrieval window ending at `now`
    ///
    /// Day and week subtract fixed durations. Month and year subtract
    /// calendar months in `now`'s time zone; a day that does not exist in
    /// the target month clamps to that month's last day (Mar 31 becomes
    /// Feb 28 or 29, Feb 29 minus a year becomes Feb 28).
    pub fn window_start<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Range::Day => now.clone() - Duration::hours(24),
            Range::Week => now.clone() - Duration::days(7),
            Range::Month => now
                .clone()
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now.clone() - Duration::days(31)),
            Range::Year => now
                .clone()
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now.clone() - Duration::days(366)),
        }
    }

    /// Inclusive `(start, end)` window ending at `now`
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
        (self.window_start(now), now.clone())
    }
}

impl FromStr for Range {
    type Err = InvalidRangeError;

    /// Parse a range name; names are matched exactly and in lowercase
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "day" => Ok(Range::Day),
            "week" => Ok(Range::Week),
            "month" => Ok(Range::Month),
            "year" => Ok(Range::Year),
            other => Err(InvalidRangeError(other.to_string())),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
