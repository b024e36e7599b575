//! Property-based tests for intervals and the month grid using proptest.
//!
//! These verify invariants that should hold for *any* input, not just the
//! specific examples in the unit test files.

use booking_engine::{month_grid, TimeInterval};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use proptest::prelude::*;

fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn arb_interval() -> impl Strategy<Value = TimeInterval> {
    (arb_time(), arb_time())
        .prop_filter("ordered pair", |(a, b)| a != b)
        .prop_map(|(a, b)| TimeInterval::new(a.min(b), a.max(b)).unwrap())
}

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    (0u32..7).prop_map(|n| match n {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    })
}

proptest! {
    // ── Interval properties ─────────────────────────────────────────────────

    #[test]
    fn construction_never_produces_inverted_intervals(a in arb_time(), b in arb_time()) {
        match TimeInterval::new(a, b) {
            Ok(iv) => prop_assert!(iv.start() < iv.end()),
            Err(_) => prop_assert!(a >= b),
        }
    }

    #[test]
    fn overlap_is_symmetric(a in arb_interval(), b in arb_interval()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn overlap_matches_half_open_formula(a in arb_interval(), b in arb_interval()) {
        let expected = a.start() < b.end() && b.start() < a.end();
        prop_assert_eq!(a.overlaps(&b), expected);
    }

    #[test]
    fn every_interval_overlaps_itself(a in arb_interval()) {
        prop_assert!(a.overlaps(&a));
    }

    #[test]
    fn duration_is_positive(a in arb_interval()) {
        prop_assert!(a.duration_minutes() > 0);
    }

    // ── Month grid properties ───────────────────────────────────────────────

    #[test]
    fn grid_contains_each_day_exactly_once(
        year in 1970i32..2100,
        month in 1u32..=12,
        start in arb_weekday(),
    ) {
        let grid = month_grid(year, month, start).unwrap();
        let mut days: Vec<u32> = grid.iter().flatten().copied().filter(|&d| d != 0).collect();
        days.sort_unstable();
        let expected: Vec<u32> =
            (1..=booking_engine::days_in_month(year, month).unwrap()).collect();
        prop_assert_eq!(days, expected);
    }

    #[test]
    fn grid_days_are_in_reading_order(
        year in 1970i32..2100,
        month in 1u32..=12,
        start in arb_weekday(),
    ) {
        let grid = month_grid(year, month, start).unwrap();
        let days: Vec<u32> = grid.iter().flatten().copied().filter(|&d| d != 0).collect();
        prop_assert!(days.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[test]
    fn day_one_lands_in_its_weekday_column(
        year in 1970i32..2100,
        month in 1u32..=12,
        start in arb_weekday(),
    ) {
        let grid = month_grid(year, month, start).unwrap();
        let col = grid[0].iter().position(|&d| d == 1).unwrap();
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let expected = (7 + first.weekday().num_days_from_monday()
            - start.num_days_from_monday()) % 7;
        prop_assert_eq!(col as u32, expected);
    }
}
