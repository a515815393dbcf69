//! Four-week sprints.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::goal::Milestone;
use super::task::Task;

/// Length of a sprint in days.
pub const SPRINT_DURATION_DAYS: u64 = 28;

/// A 4-week slice of work, optionally linked to a goal.
///
/// `goal_id` is a plain reference: the sprint does not own the goal and
/// can be completed or fall overdue on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub goal_id: Option<String>,
    pub title: String,
    /// First week of the goal window this sprint covers (1-based).
    pub week_number: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Sprint {
    pub fn end_for(start: NaiveDate) -> NaiveDate {
        start
            .checked_add_days(Days::new(SPRINT_DURATION_DAYS))
            .unwrap_or(NaiveDate::MAX)
    }
}
