//! Records stored by the event store.

mod brain_dump;
mod checkin;
mod goal;
mod habit;
mod insight;
mod sprint;
mod task;

pub use brain_dump::DailyBrainDump;
pub use checkin::{
    normalize_activities, CheckIn, Factor, Level, MoodLabel, NewCheckIn, StructuredFields,
    MAX_ACTIVITIES, MAX_TEXT_LEN,
};
pub use goal::{Category, Goal, GoalStatus, Milestone, NewGoal, GOAL_DURATION_DAYS};
pub use habit::Habit;
pub use insight::{
    ConfidenceBand, Insight, InsightMetadata, InsightType, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE,
};
pub use sprint::{Sprint, SPRINT_DURATION_DAYS};
pub use task::{NewTask, Priority, Task, TaskSource};
