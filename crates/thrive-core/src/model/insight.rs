//! Generated behavioral insights.
//!
//! Insights are regenerated from history, never edited. Each one carries the
//! raw counts behind it so a UI can show why the claim is made.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    MoodTrend,
    FactorCorrelation,
    ActivityBoost,
    Consistency,
    TimeOfDay,
    Keywords,
    GoalMomentum,
}

/// Display band for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

/// Lower bound of the high band.
pub const HIGH_CONFIDENCE: f64 = 0.8;
/// Lower bound of the medium band.
pub const MEDIUM_CONFIDENCE: f64 = 0.6;

impl ConfidenceBand {
    pub fn for_score(confidence: f64) -> ConfidenceBand {
        if confidence >= HIGH_CONFIDENCE {
            ConfidenceBand::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// Supporting numbers for an insight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightMetadata {
    /// Named percentages (0-100), e.g. good-mood rate per arm.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub frequencies: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Observation counts per time-of-day bucket.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub time_of_day: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub kind: InsightType,
    pub title: String,
    pub description: String,
    /// Clamped to [0, 1].
    pub confidence: f64,
    pub band: ConfidenceBand,
    pub data_points: usize,
    #[serde(default)]
    pub metadata: InsightMetadata,
    pub generated_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ConfidenceBand::for_score(0.95), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::for_score(0.8), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::for_score(0.79), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::for_score(0.6), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::for_score(0.59), ConfidenceBand::Low);
    }
}
