//! Consecutive-day engagement streaks.
//!
//! Streaks are always recomputed from stored calendar days; nothing here is
//! persisted. Days are compared as calendar dates, so daylight-saving shifts
//! between two check-ins cannot split or merge a run.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current and longest streaks plus simple totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_check_in_days: u32,
    pub last_check_in: Option<NaiveDate>,
}

/// Computes streaks from a set of engagement days.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCalculator;

impl StreakCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute streaks as of `today`.
    ///
    /// Input may be unsorted and contain duplicates. Days after `today` are
    /// ignored. The current streak survives while today's check-in is still
    /// pending: a run ending yesterday counts.
    pub fn compute<I>(&self, days: I, today: NaiveDate) -> EngagementStats
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let days: BTreeSet<NaiveDate> = days.into_iter().filter(|d| *d <= today).collect();

        let mut longest = 0u32;
        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;

        for day in &days {
            run = match prev {
                Some(p) if p.succ_opt() == Some(*day) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            prev = Some(*day);
        }

        let current = match prev {
            Some(last) if last == today || last.succ_opt() == Some(today) => run,
            _ => 0,
        };

        EngagementStats {
            current_streak: current,
            longest_streak: longest,
            total_check_in_days: days.len() as u32,
            last_check_in: prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn no_check_ins() {
        let s = StreakCalculator::new().compute(Vec::new(), d(2026, 5, 10));
        assert_eq!(s, EngagementStats::default());
    }

    #[test]
    fn single_check_in_today() {
        let today = d(2026, 5, 10);
        let s = StreakCalculator::new().compute([today], today);
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 1);
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let today = d(2026, 5, 10);
        let s = StreakCalculator::new().compute([d(2026, 5, 8), d(2026, 5, 9), today], today);
        assert_eq!(s.current_streak, 3);
        assert_eq!(s.longest_streak, 3);
    }

    #[test]
    fn gap_day_breaks_streak() {
        let today = d(2026, 5, 10);
        let s = StreakCalculator::new().compute([d(2026, 5, 8), today], today);
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 1);
    }

    #[test]
    fn pending_today_keeps_yesterdays_run() {
        let today = d(2026, 5, 10);
        let s = StreakCalculator::new().compute([d(2026, 5, 8), d(2026, 5, 9)], today);
        assert_eq!(s.current_streak, 2);
    }

    #[test]
    fn stale_run_resets_current_only() {
        let today = d(2026, 5, 10);
        let days = [d(2026, 5, 1), d(2026, 5, 2), d(2026, 5, 3), d(2026, 5, 7)];
        let s = StreakCalculator::new().compute(days, today);
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 3);
        assert_eq!(s.last_check_in, Some(d(2026, 5, 7)));
    }

    #[test]
    fn duplicates_and_order_do_not_matter() {
        let today = d(2026, 5, 10);
        let days = [today, d(2026, 5, 9), today, d(2026, 5, 9)];
        let s = StreakCalculator::new().compute(days, today);
        assert_eq!(s.current_streak, 2);
        assert_eq!(s.total_check_in_days, 2);
    }

    #[test]
    fn spans_daylight_saving_change() {
        // US DST starts 2026-03-08; runs are counted by calendar day.
        let today = d(2026, 3, 9);
        let s = StreakCalculator::new().compute([d(2026, 3, 7), d(2026, 3, 8), today], today);
        assert_eq!(s.current_streak, 3);
    }

    #[test]
    fn month_boundary_is_consecutive() {
        let today = d(2026, 3, 1);
        let s = StreakCalculator::new().compute([d(2026, 2, 28), today], today);
        assert_eq!(s.current_streak, 2);
    }

    proptest! {
        #[test]
        fn current_never_exceeds_longest(offsets in proptest::collection::vec(0u64..60, 0..40)) {
            let today = d(2026, 6, 30);
            let days: Vec<NaiveDate> = offsets
                .iter()
                .map(|o| today.checked_sub_days(Days::new(*o)).unwrap())
                .collect();
            let s = StreakCalculator::new().compute(days, today);
            prop_assert!(s.current_streak <= s.longest_streak);
            prop_assert!(s.longest_streak <= s.total_check_in_days);
        }
    }
}
