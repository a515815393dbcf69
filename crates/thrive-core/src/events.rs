use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Every mutation of stored records produces an Event.
/// Events are appended to the event log in the same transaction as the
/// change they describe. Draft edits keep one row per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CheckInSubmitted {
        check_in_id: String,
        date: NaiveDate,
        mood_score: u8,
        at: DateTime<FixedOffset>,
    },
    CoachReplyRecorded {
        date: NaiveDate,
        at: DateTime<FixedOffset>,
    },
    DraftUpdated {
        date: NaiveDate,
        word_count: usize,
        sentence_count: usize,
        at: DateTime<FixedOffset>,
    },
    /// The draft was frozen by the day's check-in.
    DraftFinalized {
        date: NaiveDate,
        at: DateTime<FixedOffset>,
    },
    GoalCreated {
        goal_id: String,
        at: DateTime<FixedOffset>,
    },
    GoalArchived {
        goal_id: String,
        at: DateTime<FixedOffset>,
    },
    GoalDeleted {
        goal_id: String,
        at: DateTime<FixedOffset>,
    },
    MilestoneAdded {
        milestone_id: String,
        goal_id: Option<String>,
        at: DateTime<FixedOffset>,
    },
    MilestoneCompleted {
        milestone_id: String,
        at: DateTime<FixedOffset>,
    },
    SprintCreated {
        sprint_id: String,
        goal_id: Option<String>,
        at: DateTime<FixedOffset>,
    },
    TaskAdded {
        task_id: String,
        sprint_id: Option<String>,
        at: DateTime<FixedOffset>,
    },
    TaskCompleted {
        task_id: String,
        at: DateTime<FixedOffset>,
    },
    TaskReopened {
        task_id: String,
        at: DateTime<FixedOffset>,
    },
    HabitCreated {
        habit_id: String,
        at: DateTime<FixedOffset>,
    },
    HabitLogged {
        habit_id: String,
        date: NaiveDate,
        at: DateTime<FixedOffset>,
    },
}

impl Event {
    /// Name stored in the `kind` column of the event log.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CheckInSubmitted { .. } => "CheckInSubmitted",
            Event::CoachReplyRecorded { .. } => "CoachReplyRecorded",
            Event::DraftUpdated { .. } => "DraftUpdated",
            Event::DraftFinalized { .. } => "DraftFinalized",
            Event::GoalCreated { .. } => "GoalCreated",
            Event::GoalArchived { .. } => "GoalArchived",
            Event::GoalDeleted { .. } => "GoalDeleted",
            Event::MilestoneAdded { .. } => "MilestoneAdded",
            Event::MilestoneCompleted { .. } => "MilestoneCompleted",
            Event::SprintCreated { .. } => "SprintCreated",
            Event::TaskAdded { .. } => "TaskAdded",
            Event::TaskCompleted { .. } => "TaskCompleted",
            Event::TaskReopened { .. } => "TaskReopened",
            Event::HabitCreated { .. } => "HabitCreated",
            Event::HabitLogged { .. } => "HabitLogged",
        }
    }

    /// Material events change what insights would say and advance the
    /// data revision.
    pub fn is_material(&self) -> bool {
        matches!(
            self,
            Event::CheckInSubmitted { .. }
                | Event::GoalCreated { .. }
                | Event::GoalArchived { .. }
                | Event::GoalDeleted { .. }
                | Event::MilestoneAdded { .. }
                | Event::MilestoneCompleted { .. }
                | Event::SprintCreated { .. }
                | Event::TaskAdded { .. }
                | Event::TaskCompleted { .. }
                | Event::TaskReopened { .. }
        )
    }

    pub fn at(&self) -> DateTime<FixedOffset> {
        match self {
            Event::CheckInSubmitted { at, .. }
            | Event::CoachReplyRecorded { at, .. }
            | Event::DraftUpdated { at, .. }
            | Event::DraftFinalized { at, .. }
            | Event::GoalCreated { at, .. }
            | Event::GoalArchived { at, .. }
            | Event::GoalDeleted { at, .. }
            | Event::MilestoneAdded { at, .. }
            | Event::MilestoneCompleted { at, .. }
            | Event::SprintCreated { at, .. }
            | Event::TaskAdded { at, .. }
            | Event::TaskCompleted { at, .. }
            | Event::TaskReopened { at, .. }
            | Event::HabitCreated { at, .. }
            | Event::HabitLogged { at, .. } => *at,
        }
    }
}
