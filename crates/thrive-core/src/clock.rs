//! Wall-clock source.
//!
//! Every "today" decision (streak continuation, window bounds, schedule
//! deltas) reads from an injected [`Clock`] so it can be pinned in tests.
//! Timestamps keep the local UTC offset they were taken in; calendar days
//! are derived from that local time, never from elapsed durations.

use chrono::{DateTime, FixedOffset, Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current local calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Reads the system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    /// Noon UTC on the given day.
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc()
            .fixed_offset();
        Self { now: noon }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_today_uses_local_offset() {
        // 23:30 at UTC-05:00 is already the next day in UTC.
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2026, 3, 7, 23, 30, 0).unwrap();
        let clock = FixedClock::new(now);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
    }

    #[test]
    fn at_date_is_stable() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(FixedClock::at_date(d).today(), d);
    }
}
