//! Golden tests for GFS retention.
//!
//! These tests pin the exact retained history of a long daily simulation and
//! verify determinism of plans.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use gfs_retention::{
    GfsPolicy, ResourceId, RetentionSelector, RetentionSimulator, Snapshot,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn days_between(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days().take_while(|d| *d <= to).collect()
}

/// One snapshot a day at midnight from 2000-01-01, pruned daily, for 547 days.
fn simulate_547_days() -> Vec<NaiveDate> {
    let mut sim = RetentionSimulator::new(at(2000, 1, 1, 0, 0), GfsPolicy::default()).with_resource("db");
    sim.run(547).unwrap();
    assert_eq!(sim.clock(), at(2001, 7, 1, 0, 0));
    sim.retained_dates(&ResourceId::from("db"))
}

fn daily_snapshots(from: NaiveDate, to: NaiveDate) -> Vec<Snapshot> {
    days_between(from, to)
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let created_at = Utc.from_utc_datetime(&d.and_hms_opt(3, 0, 0).unwrap());
            Snapshot::manual(format!("{:06}-{}", i, d), created_at)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// 547-day scenario
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_547_day_history_exact() {
    let retained = simulate_547_days();

    let mut expected = vec![date(2000, 1, 1)];
    // First Sunday of every month, Feb 2000 through Dec 2000.
    for month in 2..=12 {
        let first = date(2000, month, 1);
        let offset = (7 - first.weekday().num_days_from_sunday()) % 7;
        expected.push(first + Duration::days(offset as i64));
    }
    // Weekly tier: the 24 Sundays ending 2001-05-20.
    let mut sunday = date(2000, 12, 10);
    while sunday <= date(2001, 5, 20) {
        expected.push(sunday);
        sunday += Duration::days(7);
    }
    expected.extend(days_between(date(2001, 5, 27), date(2001, 6, 30)));

    assert_eq!(retained.len(), 71);
    assert_eq!(retained, expected);
}

#[test]
fn golden_547_day_daily_tier() {
    let retained = simulate_547_days();
    for day in days_between(date(2001, 5, 27), date(2001, 6, 30)) {
        assert!(retained.contains(&day), "daily tier missing {}", day);
    }
    assert!(!retained.contains(&date(2001, 5, 26)));
}

#[test]
fn golden_547_day_weekly_tier() {
    let retained = simulate_547_days();

    let mut sunday = date(2001, 5, 20);
    for _ in 0..24 {
        assert_eq!(sunday.weekday(), Weekday::Sun);
        assert!(retained.contains(&sunday), "weekly tier missing {}", sunday);
        for gap in 1..=6 {
            let other = sunday + Duration::days(gap);
            assert!(!retained.contains(&other), "unexpected {} in week of {}", other, sunday);
        }
        sunday -= Duration::days(7);
    }
    assert_eq!(sunday + Duration::days(7), date(2000, 12, 10));
}

#[test]
fn golden_547_day_monthly_tier() {
    let retained = simulate_547_days();

    assert!(!retained.contains(&date(2000, 12, 1)));
    assert!(!retained.contains(&date(2000, 12, 2)));
    assert!(retained.contains(&date(2000, 12, 3)));

    let monthly: Vec<NaiveDate> = retained
        .iter()
        .copied()
        .filter(|d| *d > date(2000, 1, 31) && *d < date(2000, 12, 1))
        .collect();
    let expected = vec![
        date(2000, 2, 6),
        date(2000, 3, 5),
        date(2000, 4, 2),
        date(2000, 5, 7),
        date(2000, 6, 4),
        date(2000, 7, 2),
        date(2000, 8, 6),
        date(2000, 9, 3),
        date(2000, 10, 1),
        date(2000, 11, 5),
    ];
    assert_eq!(monthly, expected);
}

#[test]
fn golden_547_day_oldest_survives() {
    let retained = simulate_547_days();
    assert_eq!(retained.first(), Some(&date(2000, 1, 1)));
    for day in days_between(date(2000, 1, 2), date(2000, 1, 31)) {
        assert!(!retained.contains(&day));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// One-shot planning
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_one_shot_plan_over_full_history() {
    let snapshots = daily_snapshots(date(2000, 1, 1), date(2001, 6, 30));
    let now = at(2001, 6, 30, 12, 0);

    let plan = RetentionSelector::default().plan(now, &snapshots).unwrap();

    assert_eq!(plan.retain.len(), 71);
    assert_eq!(plan.retain.len() + plan.delete.len(), snapshots.len());
    assert_eq!(plan.retain.last().map(|s| s.created_on()), Some(date(2000, 1, 1)));
    assert_eq!(plan.retain.first().map(|s| s.created_on()), Some(date(2001, 6, 30)));

    // Newest first, strictly older each step.
    for pair in plan.retain.windows(2) {
        assert!(pair[0].created_at > pair[1].created_at);
    }
}

#[test]
fn golden_plan_determinism() {
    let mut snapshots = daily_snapshots(date(2000, 6, 1), date(2001, 6, 30));
    let now = at(2001, 6, 30, 12, 0);
    let selector = RetentionSelector::default();

    let first = selector.plan(now, &snapshots).unwrap();
    for _ in 0..5 {
        let again = selector.plan(now, &snapshots).unwrap();
        assert_eq!(first.fingerprint, again.fingerprint);
        assert_eq!(first.retained_ids(), again.retained_ids());
    }

    // Input order does not matter.
    snapshots.reverse();
    let reversed = selector.plan(now, &snapshots).unwrap();
    assert_eq!(first.retained_ids(), reversed.retained_ids());
    assert_eq!(first.fingerprint, reversed.fingerprint);
}

#[test]
fn golden_replanning_retained_set_is_stable() {
    let snapshots = daily_snapshots(date(2000, 1, 1), date(2001, 6, 30));
    let now = at(2001, 6, 30, 12, 0);
    let selector = RetentionSelector::default();

    let retained = selector.select(now, &snapshots).unwrap();
    let again = selector.select(now, &retained).unwrap();
    assert_eq!(retained, again);
}

#[test]
fn golden_policy_change_changes_fingerprint() {
    let snapshots = daily_snapshots(date(2001, 1, 1), date(2001, 6, 30));
    let now = at(2001, 6, 30, 12, 0);

    let default_plan = RetentionSelector::default().plan(now, &snapshots).unwrap();
    let short_plan = RetentionSelector::new(GfsPolicy::new(7, 4, Weekday::Sun))
        .plan(now, &snapshots)
        .unwrap();

    assert_ne!(default_plan.policy_params_hash, short_plan.policy_params_hash);
    assert_ne!(default_plan.fingerprint, short_plan.fingerprint);
    assert!(short_plan.retain.len() < default_plan.retain.len());
}

// ─────────────────────────────────────────────────────────────────────────────
// Boundary-day semantics
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_late_night_and_early_morning_are_different_days() {
    let now = at(2020, 3, 10, 12, 0);
    let snapshots = vec![
        Snapshot::manual("early", at(2020, 3, 10, 0, 1)),
        Snapshot::manual("late", at(2020, 3, 9, 23, 59)),
        Snapshot::manual("older", at(2020, 3, 8, 12, 0)),
    ];

    let retained = RetentionSelector::default().select(now, &snapshots).unwrap();
    let ids: Vec<&str> = retained.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "late", "older"]);
}

#[test]
fn golden_same_day_collapses_to_oldest() {
    let now = at(2020, 3, 10, 12, 0);
    let snapshots = vec![
        Snapshot::manual("today", at(2020, 3, 10, 6, 0)),
        Snapshot::manual("late", at(2020, 3, 9, 23, 59)),
        Snapshot::manual("noon", at(2020, 3, 9, 12, 0)),
        Snapshot::manual("early", at(2020, 3, 9, 0, 1)),
    ];

    let plan = RetentionSelector::default().plan(now, &snapshots).unwrap();
    let retained: Vec<&str> = plan.retain.iter().map(|s| s.id.as_str()).collect();
    let deleted: Vec<&str> = plan.delete.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(retained, vec!["today", "early"]);
    assert_eq!(deleted, vec!["late", "noon"]);
}
