//! Retention bucket boundaries.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity of the tier that produced a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Daily tier.
    Day,
    /// Weekly tier.
    Week,
    /// Monthly tier (unbounded).
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

/// Edge between two adjacent retention buckets.
///
/// A boundary is always the start of a calendar day in UTC, so only the
/// date is stored. Comparisons against snapshots happen at day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetentionBoundary {
    /// First day inside the bucket that this boundary opens.
    pub date: NaiveDate,
    /// Tier that produced the boundary.
    pub granularity: Granularity,
}

impl RetentionBoundary {
    /// Create a boundary.
    pub fn new(date: NaiveDate, granularity: Granularity) -> Self {
        Self { date, granularity }
    }

    /// The boundary as an instant (midnight UTC).
    pub fn instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.date.and_time(NaiveTime::default()))
    }

    /// Whether `at` falls on or after this boundary's day.
    pub fn admits(&self, at: DateTime<Utc>) -> bool {
        at.date_naive() >= self.date
    }
}

impl fmt::Display for RetentionBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.granularity, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_instant_is_midnight_utc() {
        let boundary = RetentionBoundary::new(day(2020, 3, 10), Granularity::Day);
        assert_eq!(boundary.instant(), Utc.with_ymd_and_hms(2020, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_admits_at_day_granularity() {
        let boundary = RetentionBoundary::new(day(2020, 3, 10), Granularity::Day);

        assert!(boundary.admits(Utc.with_ymd_and_hms(2020, 3, 10, 0, 1, 0).unwrap()));
        assert!(boundary.admits(Utc.with_ymd_and_hms(2020, 3, 10, 23, 59, 0).unwrap()));
        assert!(boundary.admits(Utc.with_ymd_and_hms(2020, 3, 11, 0, 0, 0).unwrap()));
        assert!(!boundary.admits(Utc.with_ymd_and_hms(2020, 3, 9, 23, 59, 0).unwrap()));
    }

    #[test]
    fn test_display() {
        let boundary = RetentionBoundary::new(day(2020, 3, 1), Granularity::Month);
        assert_eq!(boundary.to_string(), "month@2020-03-01");
    }
}
