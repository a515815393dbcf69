//! # Thrive Core Library
//!
//! Behavioral analytics and progress engine for the Thrive wellbeing
//! tracker. All operations are available through the `thrive` CLI binary,
//! which is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite record store with an append-only event log, plus
//!   TOML configuration
//! - **Analytics**: streaks, time windows, factor correlations, insights
//!   and goal progress, all recomputed from stored records
//! - **Coach**: async, cancellable boundary to an external AI coach
//!
//! ## Key Components
//!
//! - [`Engine`]: facade that owns the store, clock and config
//! - [`EventStore`]: record and event persistence
//! - [`Config`]: application configuration management
//! - [`AiCoach`]: trait for coach backends

pub mod analytics;
pub mod clock;
pub mod coach;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod storage;

pub use analytics::{
    ActivityCorrelation, CorrelationEngine, DailyProgressPoint, EngagementStats,
    FactorCorrelation, GoalProgress, InsightGenerator, ProgressTracker, ScheduleStatus,
    SprintProgress, StreakCalculator, TimeWindowAggregator, Timeframe, WindowSummary,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use coach::{request_reply, AiCoach, CoachPrompt, CoachReply, HttpCoach, ReplySource};
pub use engine::{Engine, HabitStreak};
pub use error::{CoachError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use model::{
    Category, CheckIn, DailyBrainDump, Goal, GoalStatus, Habit, Insight, Level, Milestone,
    MoodLabel, NewCheckIn, NewGoal, NewTask, Priority, Sprint, StructuredFields, Task,
};
pub use storage::{Config, EventStore};
