//! Pure analytics over stored history.
//!
//! Nothing in this module touches storage or the clock. Callers pass
//! records and `today` explicitly so every result is reproducible.

mod correlation;
mod insight;
mod progress;
mod streak;
pub mod unlock;
mod window;

pub use correlation::{
    ActivityCorrelation, ArmStats, CorrelationEngine, FactorCorrelation, DEFAULT_GOOD_MOOD,
    DEFAULT_MIN_SAMPLES,
};
pub use insight::{InsightGenerator, InsightInput, DEFAULT_INSIGHT_LIMIT, DEFAULT_SAMPLE_SATURATION};
pub use progress::{
    elapsed_fraction, work_fraction, DailyProgressPoint, GoalProgress, ProgressTracker,
    ScheduleStatus, SprintProgress, ON_TRACK_EPSILON,
};
pub use streak::{EngagementStats, StreakCalculator};
pub use unlock::DraftMetrics;
pub use window::{ratio, Bucket, Dated, Timeframe, TimeWindowAggregator, WindowSummary};
