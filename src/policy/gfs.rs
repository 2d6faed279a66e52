//! GFS policy v1: daily, then weekly, then monthly forever.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::boundaries::BoundaryGenerator;
use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_POLICY_VERSION;

/// Default number of daily boundaries.
pub const DEFAULT_DAILY_COUNT: u32 = 35;

/// Default number of weekly boundaries (including the week-aligned one).
pub const DEFAULT_WEEKLY_COUNT: u32 = 24;

/// Default first day of the week.
pub const DEFAULT_WEEK_START: Weekday = Weekday::Sun;

/// Grandfather-father-son retention policy.
///
/// ## Parameters
///
/// - `daily_count`: boundaries one calendar day apart, starting today
/// - `weekly_count`: boundaries one week apart, aligned to `week_start`
/// - `week_start`: first day of a calendar week
///
/// The monthly tier has no parameter: it is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GfsPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Number of daily boundaries.
    pub daily_count: u32,
    /// Number of weekly boundaries.
    pub weekly_count: u32,
    /// First day of the week for weekly alignment.
    pub week_start: Weekday,
}

impl GfsPolicy {
    /// Create a policy with custom tier lengths.
    pub fn new(daily_count: u32, weekly_count: u32, week_start: Weekday) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            daily_count,
            weekly_count,
            week_start,
        }
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Hash of the policy parameters.
    ///
    /// Two policies with the same hash produce identical boundary sequences.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }

    /// Fresh boundary sequence starting at `now`.
    pub fn boundaries(&self, now: DateTime<Utc>) -> BoundaryGenerator {
        BoundaryGenerator::new(now, self)
    }
}

impl Default for GfsPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_COUNT, DEFAULT_WEEKLY_COUNT, DEFAULT_WEEK_START)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let policy = GfsPolicy::default();
        assert_eq!(policy.daily_count, 35);
        assert_eq!(policy.weekly_count, 24);
        assert_eq!(policy.week_start, Weekday::Sun);
        assert_eq!(policy.policy_id(), "gfs_policy_v1");
    }

    #[test]
    fn test_params_hash_determinism() {
        assert_eq!(GfsPolicy::default().params_hash(), GfsPolicy::default().params_hash());
    }

    #[test]
    fn test_params_hash_changes() {
        let policy1 = GfsPolicy::default();
        let mut policy2 = GfsPolicy::default();
        policy2.week_start = Weekday::Mon;

        assert_ne!(policy1.params_hash(), policy2.params_hash());
    }

    #[test]
    fn test_policy_serde_roundtrip() {
        let policy = GfsPolicy::new(7, 4, Weekday::Mon);
        let json = serde_json::to_string(&policy).unwrap();
        let back: GfsPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
