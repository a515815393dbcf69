//! Twelve-week goals and their milestones.

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Length of a goal window in days (12 weeks).
pub const GOAL_DURATION_DAYS: u64 = 84;

/// Life area a goal or task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Health,
    Career,
    Relationships,
    PersonalGrowth,
    Finance,
    Creativity,
    Mindfulness,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Career => "career",
            Category::Relationships => "relationships",
            Category::PersonalGrowth => "personal_growth",
            Category::Finance => "finance",
            Category::Creativity => "creativity",
            Category::Mindfulness => "mindfulness",
            Category::Other => "other",
        }
    }

    /// Unknown names fall back to `Other`.
    pub fn parse(value: &str) -> Category {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "health" | "fitness" => Category::Health,
            "career" | "work" => Category::Career,
            "relationships" | "social" => Category::Relationships,
            "personal_growth" | "growth" | "learning" => Category::PersonalGrowth,
            "finance" | "money" => Category::Finance,
            "creativity" | "creative" => Category::Creativity,
            "mindfulness" => Category::Mindfulness,
            _ => Category::Other,
        }
    }
}

/// Lifecycle of a goal. Goals are archived, not deleted, while referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Archived,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> GoalStatus {
        match value {
            "completed" => GoalStatus::Completed,
            "archived" => GoalStatus::Archived,
            _ => GoalStatus::Active,
        }
    }
}

/// A checkpoint inside a goal or sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub goal_id: Option<String>,
    pub sprint_id: Option<String>,
    pub title: String,
    pub target_date: NaiveDate,
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl Milestone {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Mark complete. The completion timestamp is set exactly once.
    pub fn complete(&mut self, at: DateTime<FixedOffset>) -> Result<(), ValidationError> {
        if self.completed_at.is_some() {
            return Err(ValidationError::MilestoneAlreadyCompleted {
                id: self.id.clone(),
            });
        }
        self.completed_at = Some(at);
        Ok(())
    }

    /// Whether the milestone was complete by the end of `day`.
    pub fn completed_by(&self, day: NaiveDate) -> bool {
        self.completed_at.is_some_and(|at| at.date_naive() <= day)
    }
}

/// A 12-week goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub created_on: NaiveDate,
    pub target_date: NaiveDate,
    pub status: GoalStatus,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Cached percentage, recomputed on every read.
    #[serde(default)]
    pub progress: f64,
}

impl Goal {
    pub fn target_for(created_on: NaiveDate) -> NaiveDate {
        created_on
            .checked_add_days(Days::new(GOAL_DURATION_DAYS))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn milestones_completed(&self) -> usize {
        self.milestones.iter().filter(|m| m.is_completed()).count()
    }

    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }
}

/// Input for creating a goal.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
}

impl NewGoal {
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn milestone() -> Milestone {
        Milestone {
            id: "m1".into(),
            goal_id: Some("g1".into()),
            sprint_id: None,
            title: "Run 5k".into(),
            target_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            completed_at: None,
        }
    }

    #[test]
    fn target_is_84_days_out() {
        let created = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(
            Goal::target_for(created),
            NaiveDate::from_ymd_opt(2026, 3, 26).unwrap()
        );
    }

    #[test]
    fn milestone_completes_once() {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 10, 9, 0, 0)
            .unwrap();
        let mut m = milestone();
        m.complete(at).unwrap();
        assert!(m.is_completed());
        let later = at + chrono::Duration::days(1);
        assert!(m.complete(later).is_err());
        assert_eq!(m.completed_at, Some(at));
    }

    #[test]
    fn category_parse_falls_back() {
        assert_eq!(Category::parse("Personal Growth"), Category::PersonalGrowth);
        assert_eq!(Category::parse("???"), Category::Other);
    }
}
