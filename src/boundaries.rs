//! Lazy generator of retention bucket boundaries.
//!
//! The sequence for a reference instant `now` is:
//!
//! ```text
//! daily:   t0, t0-1d, ..., t0-(daily_count-1)d          t0 = start of now's day
//! weekly:  W, W-1w, ..., W-(weekly_count-1)w            W  = start of week of (t0 - daily_count d)
//! monthly: M, M-1mo, M-2mo, ...                         M  = start of month of the last weekly value
//! ```
//!
//! When the last weekly value is itself the 1st of a month, `M` would repeat
//! it and is skipped, so the sequence stays strictly decreasing.
//!
//! Each generator is an independent cursor; nothing is shared between
//! sequences and nothing is materialized ahead of the caller.

use std::iter::FusedIterator;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc, Weekday};

use crate::policy::GfsPolicy;
use crate::types::{Granularity, RetentionBoundary};

/// Position of the generator within the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Daily { remaining: u32 },
    WeekAnchor,
    Weekly { remaining: u32 },
    MonthAnchor,
    Monthly,
    /// Calendar lower limit reached.
    Exhausted,
}

/// Strictly decreasing, unbounded sequence of [`RetentionBoundary`] values.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use gfs_retention::{BoundaryGenerator, GfsPolicy};
///
/// let now = Utc.with_ymd_and_hms(2001, 6, 30, 15, 0, 0).unwrap();
/// let mut boundaries = BoundaryGenerator::new(now, &GfsPolicy::default());
/// assert_eq!(boundaries.next().unwrap().date.to_string(), "2001-06-30");
/// assert_eq!(boundaries.nth(34).unwrap().date.to_string(), "2001-05-20");
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryGenerator {
    cursor: NaiveDate,
    last_emitted: Option<NaiveDate>,
    tier: Tier,
    weekly_count: u32,
    week_start: Weekday,
}

impl BoundaryGenerator {
    /// Start a sequence at the day containing `now` (UTC).
    pub fn new(now: DateTime<Utc>, policy: &GfsPolicy) -> Self {
        Self::from_date(now.date_naive(), policy)
    }

    /// Start a sequence at `today`.
    pub fn from_date(today: NaiveDate, policy: &GfsPolicy) -> Self {
        Self {
            cursor: today,
            last_emitted: None,
            tier: Tier::Daily {
                remaining: policy.daily_count,
            },
            weekly_count: policy.weekly_count,
            week_start: policy.week_start,
        }
    }

    /// Granularity of the next boundary, or `None` once exhausted.
    pub fn current_granularity(&self) -> Option<Granularity> {
        match self.tier {
            Tier::Daily { remaining } if remaining > 0 => Some(Granularity::Day),
            Tier::Daily { .. } | Tier::WeekAnchor if self.weekly_count > 0 => Some(Granularity::Week),
            Tier::Weekly { remaining } if remaining > 0 => Some(Granularity::Week),
            Tier::Exhausted => None,
            _ => Some(Granularity::Month),
        }
    }

    fn emit(&mut self, date: NaiveDate, granularity: Granularity) -> RetentionBoundary {
        self.last_emitted = Some(date);
        RetentionBoundary::new(date, granularity)
    }

    fn step(&mut self) -> Option<RetentionBoundary> {
        loop {
            match self.tier {
                Tier::Daily { remaining: 0 } => self.tier = Tier::WeekAnchor,
                Tier::Daily { remaining } => {
                    let date = self.cursor;
                    self.tier = match date.checked_sub_days(Days::new(1)) {
                        Some(previous) => {
                            self.cursor = previous;
                            Tier::Daily { remaining: remaining - 1 }
                        }
                        None => Tier::Exhausted,
                    };
                    return Some(self.emit(date, Granularity::Day));
                }
                Tier::WeekAnchor if self.weekly_count == 0 => self.tier = Tier::MonthAnchor,
                Tier::WeekAnchor => {
                    self.cursor = start_of_week(self.cursor, self.week_start)?;
                    self.tier = Tier::Weekly {
                        remaining: self.weekly_count - 1,
                    };
                    return Some(self.emit(self.cursor, Granularity::Week));
                }
                Tier::Weekly { remaining: 0 } => self.tier = Tier::MonthAnchor,
                Tier::Weekly { remaining } => {
                    self.cursor = self.cursor.checked_sub_days(Days::new(7))?;
                    self.tier = Tier::Weekly { remaining: remaining - 1 };
                    return Some(self.emit(self.cursor, Granularity::Week));
                }
                Tier::MonthAnchor => {
                    self.cursor = start_of_month(self.cursor)?;
                    self.tier = Tier::Monthly;
                    // A weekly boundary on the 1st already opens this month.
                    if self.last_emitted != Some(self.cursor) {
                        return Some(self.emit(self.cursor, Granularity::Month));
                    }
                }
                Tier::Monthly => {
                    self.cursor = self.cursor.checked_sub_months(Months::new(1))?;
                    return Some(self.emit(self.cursor, Granularity::Month));
                }
                Tier::Exhausted => return None,
            }
        }
    }
}

impl Iterator for BoundaryGenerator {
    type Item = RetentionBoundary;

    fn next(&mut self) -> Option<RetentionBoundary> {
        let boundary = self.step();
        if boundary.is_none() {
            self.tier = Tier::Exhausted;
        }
        boundary
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.tier {
            Tier::Exhausted => (0, Some(0)),
            _ => (usize::MAX, None),
        }
    }
}

impl FusedIterator for BoundaryGenerator {}

/// First day of the week containing `date`.
fn start_of_week(date: NaiveDate, week_start: Weekday) -> Option<NaiveDate> {
    let offset = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(offset)))
}

/// First day of the month containing `date`.
fn start_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.day0())))
}
