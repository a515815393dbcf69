//! Time-windowed filtering and rollups.
//!
//! A window is `[lower_bound, today]` in calendar days, both ends inclusive.
//! `Week` covers the most recent 7 calendar days; `Month`, `Quarter` and
//! `Year` subtract calendar months (1, 3, 12) from today, so their length
//! follows the calendar rather than a fixed day count.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{CheckIn, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Week,
    Month,
    Quarter,
    Year,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Quarter => "quarter",
            Timeframe::Year => "year",
        }
    }

    pub fn parse(value: &str) -> Option<Timeframe> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" | "w" => Some(Timeframe::Week),
            "month" | "m" => Some(Timeframe::Month),
            "quarter" | "q" => Some(Timeframe::Quarter),
            "year" | "y" => Some(Timeframe::Year),
            _ => None,
        }
    }

    /// First calendar day inside the window ending on `today`.
    pub fn lower_bound(self, today: NaiveDate) -> NaiveDate {
        let bound = match self {
            Timeframe::Week => today.checked_sub_days(Days::new(6)),
            Timeframe::Month => today.checked_sub_months(Months::new(1)),
            Timeframe::Quarter => today.checked_sub_months(Months::new(3)),
            Timeframe::Year => today.checked_sub_months(Months::new(12)),
        };
        bound.unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(self, day: NaiveDate, today: NaiveDate) -> bool {
        day >= self.lower_bound(today) && day <= today
    }

    fn granularity(self) -> Granularity {
        match self {
            Timeframe::Week => Granularity::Day,
            Timeframe::Month | Timeframe::Quarter => Granularity::Week,
            Timeframe::Year => Granularity::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Day,
    Week,
    Month,
}

/// Records that fall on a calendar day.
pub trait Dated {
    fn day(&self) -> NaiveDate;
}

impl Dated for CheckIn {
    fn day(&self) -> NaiveDate {
        self.date
    }
}

/// One rollup bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub check_ins: usize,
    pub mood_average: f64,
}

/// Aggregates over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub timeframe: Timeframe,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub check_ins: usize,
    pub mood_average: f64,
    pub mood_distribution: BTreeMap<String, usize>,
    pub tasks_considered: usize,
    pub tasks_completed: usize,
    pub task_completion_rate: f64,
    pub buckets: Vec<Bucket>,
}

/// Filters and rolls up dated records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindowAggregator;

impl TimeWindowAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Records inside the window, ordered by day. Ties keep input order.
    pub fn within<'a, T: Dated>(
        &self,
        records: &'a [T],
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> Vec<&'a T> {
        let mut out: Vec<&T> = records
            .iter()
            .filter(|r| timeframe.contains(r.day(), today))
            .collect();
        out.sort_by_key(|r| r.day());
        out
    }

    /// Mean mood score, 0.0 when empty.
    pub fn mood_average(&self, check_ins: &[&CheckIn]) -> f64 {
        if check_ins.is_empty() {
            return 0.0;
        }
        let total: u32 = check_ins.iter().map(|c| c.mood_score() as u32).sum();
        total as f64 / check_ins.len() as f64
    }

    /// Count per mood label; every label is present.
    pub fn mood_distribution(&self, check_ins: &[&CheckIn]) -> BTreeMap<String, usize> {
        let mut dist: BTreeMap<String, usize> = crate::model::MoodLabel::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), 0))
            .collect();
        for c in check_ins {
            *dist.entry(c.mood.as_str().to_string()).or_insert(0) += 1;
        }
        dist
    }

    /// Tasks whose due day (or creation day when undated) lies in the
    /// window, and the share of them completed. Rate is 0.0 when none.
    pub fn task_completion(
        &self,
        tasks: &[Task],
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> (usize, usize, f64) {
        let considered: Vec<&Task> = tasks
            .iter()
            .filter(|t| {
                let day = t.due_date.unwrap_or_else(|| t.created_at.date_naive());
                timeframe.contains(day, today)
            })
            .collect();
        let done = considered.iter().filter(|t| t.is_completed()).count();
        (considered.len(), done, ratio(done, considered.len()))
    }

    /// Bucketed check-in counts and mood averages covering the whole window,
    /// including empty buckets.
    pub fn rollup(
        &self,
        check_ins: &[CheckIn],
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> Vec<Bucket> {
        let selected = self.within(check_ins, timeframe, today);
        bucket_bounds(timeframe, today)
            .into_iter()
            .map(|(start, end)| {
                let members: Vec<&CheckIn> = selected
                    .iter()
                    .copied()
                    .filter(|c| c.date >= start && c.date <= end)
                    .collect();
                Bucket {
                    start,
                    end,
                    check_ins: members.len(),
                    mood_average: self.mood_average(&members),
                }
            })
            .collect()
    }

    pub fn summarize(
        &self,
        check_ins: &[CheckIn],
        tasks: &[Task],
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> WindowSummary {
        let selected = self.within(check_ins, timeframe, today);
        let (considered, completed, rate) = self.task_completion(tasks, timeframe, today);
        WindowSummary {
            timeframe,
            start: timeframe.lower_bound(today),
            end: today,
            check_ins: selected.len(),
            mood_average: self.mood_average(&selected),
            mood_distribution: self.mood_distribution(&selected),
            tasks_considered: considered,
            tasks_completed: completed,
            task_completion_rate: rate,
            buckets: self.rollup(check_ins, timeframe, today),
        }
    }
}

/// `part / whole`, or 0.0 when `whole` is zero.
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn bucket_bounds(timeframe: Timeframe, today: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let lower = timeframe.lower_bound(today);
    let mut out = Vec::new();
    let mut start = lower;
    while start <= today {
        let next = match timeframe.granularity() {
            Granularity::Day => start.succ_opt(),
            Granularity::Week => start.checked_add_days(Days::new(7)),
            Granularity::Month => NaiveDate::from_ymd_opt(start.year(), start.month(), 1)
                .and_then(|first| first.checked_add_months(Months::new(1))),
        };
        let Some(next) = next else {
            out.push((start, today));
            break;
        };
        let end = next.pred_opt().unwrap_or(next).min(today);
        out.push((start, end));
        start = next;
    }
    out
}
