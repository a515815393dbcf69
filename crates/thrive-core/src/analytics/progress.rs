//! Goal and sprint completion tracking.
//!
//! Visible progress is driven by completed work (milestones and tasks), not
//! by elapsed time. Elapsed time only sets the expected pace the work is
//! compared against to decide whether a goal is ahead of or behind schedule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Goal, Milestone, Sprint, Task, GOAL_DURATION_DAYS};

/// Schedule deltas within this fraction count as on track.
pub const ON_TRACK_EPSILON: f64 = 0.03;

/// Share of work progress carried by milestones when a goal has both
/// milestones and tasks.
pub const MILESTONE_WEIGHT: f64 = 0.7;
/// Share carried by sprint tasks when a goal has both.
pub const TASK_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Ahead,
    OnTrack,
    Behind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_id: String,
    /// Work-driven completion, 0-100.
    pub percentage: f64,
    pub milestones_completed: usize,
    pub milestones_total: usize,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    /// Share of the 84-day window elapsed, 0-100.
    pub time_elapsed_percentage: f64,
    pub days_remaining: i64,
    pub status: ScheduleStatus,
    /// Ahead (`>= 0` delta) or within the on-track band.
    pub is_on_track: bool,
    /// Whole days ahead (positive) or behind (negative); `None` when on track.
    pub days_delta: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintProgress {
    pub sprint_id: String,
    pub percentage: f64,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub milestones_completed: usize,
    pub milestones_total: usize,
    /// Negative once the sprint has ended.
    pub days_remaining: i64,
    pub is_active: bool,
    pub is_overdue: bool,
}

/// Work completion of a goal at the end of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgressPoint {
    pub date: NaiveDate,
    pub percentage: f64,
    pub expected_percentage: f64,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    pub on_track_epsilon: f64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            on_track_epsilon: ON_TRACK_EPSILON,
        }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(on_track_epsilon: f64) -> Self {
        Self {
            on_track_epsilon: on_track_epsilon.abs(),
        }
    }

    /// Progress of `goal` as of `today`. `tasks` are the tasks of every
    /// sprint linked to the goal.
    pub fn goal_progress(&self, goal: &Goal, tasks: &[Task], today: NaiveDate) -> GoalProgress {
        let work = work_fraction(&goal.milestones, tasks, today);
        let elapsed = elapsed_fraction(goal.created_on, today);
        let (status, days_delta) = self.schedule(work, elapsed);

        GoalProgress {
            goal_id: goal.id.clone(),
            percentage: work * 100.0,
            milestones_completed: goal.milestones_completed(),
            milestones_total: goal.milestones.len(),
            tasks_completed: tasks.iter().filter(|t| t.is_completed()).count(),
            tasks_total: tasks.len(),
            time_elapsed_percentage: elapsed * 100.0,
            days_remaining: (goal.target_date - today).num_days(),
            status,
            is_on_track: status != ScheduleStatus::Behind,
            days_delta,
        }
    }

    /// Compare actual against expected completion.
    pub fn schedule(&self, actual: f64, expected: f64) -> (ScheduleStatus, Option<i64>) {
        let delta = actual - expected;
        if delta.abs() <= self.on_track_epsilon {
            return (ScheduleStatus::OnTrack, None);
        }
        let days = (delta * GOAL_DURATION_DAYS as f64).round() as i64;
        if delta > 0.0 {
            (ScheduleStatus::Ahead, Some(days))
        } else {
            (ScheduleStatus::Behind, Some(days))
        }
    }

    pub fn sprint_progress(&self, sprint: &Sprint, today: NaiveDate) -> SprintProgress {
        let tasks_completed = sprint.tasks.iter().filter(|t| t.is_completed()).count();
        let milestones_completed = sprint.milestones.iter().filter(|m| m.is_completed()).count();
        let done = tasks_completed + milestones_completed;
        let total = sprint.tasks.len() + sprint.milestones.len();
        let percentage = super::window::ratio(done, total) * 100.0;

        SprintProgress {
            sprint_id: sprint.id.clone(),
            percentage,
            tasks_completed,
            tasks_total: sprint.tasks.len(),
            milestones_completed,
            milestones_total: sprint.milestones.len(),
            days_remaining: (sprint.end_date - today).num_days(),
            is_active: sprint.start_date <= today && today <= sprint.end_date,
            is_overdue: today > sprint.end_date && percentage < 100.0,
        }
    }

    /// One point per day from goal creation through `today` (capped at the
    /// target date), using completion timestamps.
    pub fn daily_history(
        &self,
        goal: &Goal,
        tasks: &[Task],
        today: NaiveDate,
    ) -> Vec<DailyProgressPoint> {
        let last = today.min(goal.target_date);
        goal.created_on
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| DailyProgressPoint {
                date: day,
                percentage: work_fraction(&goal.milestones, tasks, day) * 100.0,
                expected_percentage: elapsed_fraction(goal.created_on, day) * 100.0,
            })
            .collect()
    }
}

/// Fraction of the goal window elapsed on `day`, clamped to [0, 1].
pub fn elapsed_fraction(created_on: NaiveDate, day: NaiveDate) -> f64 {
    let days = (day - created_on).num_days() as f64;
    (days / GOAL_DURATION_DAYS as f64).clamp(0.0, 1.0)
}

/// Completed-work fraction as of the end of `day`.
///
/// Milestones and tasks are blended with [`MILESTONE_WEIGHT`] and
/// [`TASK_WEIGHT`] when both exist; a goal with neither has done no work.
pub fn work_fraction(milestones: &[Milestone], tasks: &[Task], day: NaiveDate) -> f64 {
    let m_done = milestones.iter().filter(|m| m.completed_by(day)).count();
    let existing: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.created_at.date_naive() <= day)
        .collect();
    let t_done = existing.iter().filter(|t| t.completed_by(day)).count();

    let m_frac = super::window::ratio(m_done, milestones.len());
    let t_frac = super::window::ratio(t_done, existing.len());

    match (milestones.is_empty(), existing.is_empty()) {
        (false, false) => MILESTONE_WEIGHT * m_frac + TASK_WEIGHT * t_frac,
        (false, true) => m_frac,
        (true, false) => t_frac,
        (true, true) => 0.0,
    }
}
