//! Daily mood/activity check-ins.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum characters accepted for each free-text answer.
pub const MAX_TEXT_LEN: usize = 2000;

/// Maximum activity tags kept on one check-in.
pub const MAX_ACTIVITIES: usize = 12;

/// Five-level mood scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLabel {
    Awful,
    Bad,
    Okay,
    Good,
    Amazing,
}

impl MoodLabel {
    pub const ALL: [MoodLabel; 5] = [
        MoodLabel::Awful,
        MoodLabel::Bad,
        MoodLabel::Okay,
        MoodLabel::Good,
        MoodLabel::Amazing,
    ];

    /// Numeric value on the 1-5 scale.
    pub fn score(self) -> u8 {
        match self {
            MoodLabel::Awful => 1,
            MoodLabel::Bad => 2,
            MoodLabel::Okay => 3,
            MoodLabel::Good => 4,
            MoodLabel::Amazing => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoodLabel::Awful => "awful",
            MoodLabel::Bad => "bad",
            MoodLabel::Okay => "okay",
            MoodLabel::Good => "good",
            MoodLabel::Amazing => "amazing",
        }
    }

    /// Resolve any label to a mood. Unknown labels map to `Okay`.
    pub fn parse(label: &str) -> MoodLabel {
        match label.trim().to_ascii_lowercase().as_str() {
            "1" | "awful" | "terrible" => MoodLabel::Awful,
            "2" | "bad" | "low" => MoodLabel::Bad,
            "4" | "good" | "great" => MoodLabel::Good,
            "5" | "amazing" | "fantastic" => MoodLabel::Amazing,
            _ => MoodLabel::Okay,
        }
    }
}

/// Three-level ordinal used by energy, sleep and social fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Level> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "poor" | "1" => Some(Level::Low),
            "medium" | "okay" | "ok" | "2" => Some(Level::Medium),
            "high" | "great" | "3" => Some(Level::High),
            _ => None,
        }
    }
}

/// Structured factors recorded alongside mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Energy,
    Sleep,
    Social,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Energy, Factor::Sleep, Factor::Social];

    pub fn as_str(self) -> &'static str {
        match self {
            Factor::Energy => "energy",
            Factor::Sleep => "sleep",
            Factor::Social => "social",
        }
    }
}

/// Optional structured answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFields {
    #[serde(default)]
    pub energy: Option<Level>,
    #[serde(default)]
    pub sleep: Option<Level>,
    #[serde(default)]
    pub social: Option<Level>,
}

/// One check-in per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: String,
    pub date: NaiveDate,
    pub mood: MoodLabel,
    pub happy_thing: String,
    pub improve_thing: String,
    #[serde(flatten)]
    pub fields: StructuredFields,
    #[serde(default)]
    pub activities: Vec<String>,
    pub ai_response: Option<String>,
    pub submitted_at: DateTime<FixedOffset>,
}

impl CheckIn {
    pub fn mood_score(&self) -> u8 {
        self.mood.score()
    }

    pub fn factor(&self, factor: Factor) -> Option<Level> {
        match factor {
            Factor::Energy => self.fields.energy,
            Factor::Sleep => self.fields.sleep,
            Factor::Social => self.fields.social,
        }
    }
}

/// Input for submitting a check-in.
#[derive(Debug, Clone, Default)]
pub struct NewCheckIn {
    pub mood: String,
    pub happy_thing: String,
    pub improve_thing: String,
    pub fields: StructuredFields,
    pub activities: Vec<String>,
}

impl NewCheckIn {
    pub fn new(mood: impl Into<String>) -> Self {
        Self {
            mood: mood.into(),
            ..Default::default()
        }
    }

    pub fn happy(mut self, text: impl Into<String>) -> Self {
        self.happy_thing = text.into();
        self
    }

    pub fn improve(mut self, text: impl Into<String>) -> Self {
        self.improve_thing = text.into();
        self
    }

    pub fn fields(mut self, fields: StructuredFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn activities<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activities = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check required fields and normalize the tag list.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mood.trim().is_empty() {
            return Err(ValidationError::MissingField("mood"));
        }
        if self.happy_thing.chars().count() > MAX_TEXT_LEN {
            return Err(ValidationError::TooLong {
                field: "happy_thing",
                max: MAX_TEXT_LEN,
            });
        }
        if self.improve_thing.chars().count() > MAX_TEXT_LEN {
            return Err(ValidationError::TooLong {
                field: "improve_thing",
                max: MAX_TEXT_LEN,
            });
        }
        if normalize_activities(&self.activities).len() > MAX_ACTIVITIES {
            return Err(ValidationError::InvalidValue {
                field: "activities",
                message: format!("at most {MAX_ACTIVITIES} tags"),
            });
        }
        Ok(())
    }
}

/// Lowercase, trim and deduplicate activity tags, keeping first-seen order.
pub fn normalize_activities(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_parse_is_total() {
        assert_eq!(MoodLabel::parse("Amazing"), MoodLabel::Amazing);
        assert_eq!(MoodLabel::parse(" awful "), MoodLabel::Awful);
        assert_eq!(MoodLabel::parse("2"), MoodLabel::Bad);
        assert_eq!(MoodLabel::parse("sparkly"), MoodLabel::Okay);
        assert_eq!(MoodLabel::parse("").score(), 3);
    }

    #[test]
    fn mood_scores_cover_one_to_five() {
        let scores: Vec<u8> = MoodLabel::ALL.iter().map(|m| m.score()).collect();
        assert_eq!(scores, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn validate_rejects_missing_mood() {
        let input = NewCheckIn::new("  ");
        assert!(matches!(
            input.validate(),
            Err(ValidationError::MissingField("mood"))
        ));
    }

    #[test]
    fn validate_rejects_long_text() {
        let input = NewCheckIn::new("good").happy("x".repeat(MAX_TEXT_LEN + 1));
        assert!(matches!(
            input.validate(),
            Err(ValidationError::TooLong { field: "happy_thing", .. })
        ));
    }

    #[test]
    fn activities_are_normalized() {
        let tags = vec![
            "Exercise".to_string(),
            " exercise ".to_string(),
            "".to_string(),
            "Reading".to_string(),
        ];
        assert_eq!(normalize_activities(&tags), vec!["exercise", "reading"]);
    }
}
