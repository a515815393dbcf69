//! Co-occurrence of good mood with structured factors and activity tags.
//!
//! For each factor the engine compares the good-mood rate when the factor is
//! favorable (`High`) against the rate when it is unfavorable (`Low`).
//! `Medium` observations belong to neither arm. The two rates are independent
//! percentages and need not sum to 100.
//!
//! A result is only produced when both arms reach `min_samples`; otherwise
//! the factor is omitted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::{CheckIn, Factor, Level};

/// Default minimum observations per arm.
pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// Default mood score counted as "good" (inclusive).
pub const DEFAULT_GOOD_MOOD: u8 = 4;

/// One side of a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub samples: usize,
    pub good: usize,
    /// Good-mood percentage, 0-100.
    pub rate: f64,
    pub mood_average: f64,
}

impl ArmStats {
    fn from_scores(scores: &[u8], good_threshold: u8) -> Self {
        let samples = scores.len();
        if samples == 0 {
            return Self::default();
        }
        let good = scores.iter().filter(|s| **s >= good_threshold).count();
        let total: u32 = scores.iter().map(|s| *s as u32).sum();
        Self {
            samples,
            good,
            rate: good as f64 * 100.0 / samples as f64,
            mood_average: total as f64 / samples as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCorrelation {
    pub factor: Factor,
    pub favorable: ArmStats,
    pub unfavorable: ArmStats,
    /// `favorable.rate - unfavorable.rate`, in percentage points.
    pub difference: f64,
}

impl FactorCorrelation {
    pub fn data_points(&self) -> usize {
        self.favorable.samples + self.unfavorable.samples
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCorrelation {
    pub activity: String,
    pub with: ArmStats,
    pub without: ArmStats,
    /// `with.rate - without.rate`, in percentage points.
    pub difference: f64,
}

impl ActivityCorrelation {
    pub fn data_points(&self) -> usize {
        self.with.samples + self.without.samples
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    pub min_samples: usize,
    pub good_mood_threshold: u8,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_SAMPLES,
            good_mood_threshold: DEFAULT_GOOD_MOOD,
        }
    }
}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(min_samples: usize, good_mood_threshold: u8) -> Self {
        Self {
            min_samples: min_samples.max(1),
            good_mood_threshold,
        }
    }

    /// Compare good-mood rates across one factor's favorable and
    /// unfavorable arms.
    ///
    /// # Errors
    /// `InsufficientData` when either arm is under `min_samples`.
    pub fn factor_correlation(
        &self,
        check_ins: &[CheckIn],
        factor: Factor,
    ) -> Result<FactorCorrelation> {
        let mut high = Vec::new();
        let mut low = Vec::new();
        for c in check_ins {
            match c.factor(factor) {
                Some(Level::High) => high.push(c.mood_score()),
                Some(Level::Low) => low.push(c.mood_score()),
                _ => {}
            }
        }
        self.require(high.len().min(low.len()))?;

        let favorable = ArmStats::from_scores(&high, self.good_mood_threshold);
        let unfavorable = ArmStats::from_scores(&low, self.good_mood_threshold);
        Ok(FactorCorrelation {
            factor,
            favorable,
            unfavorable,
            difference: favorable.rate - unfavorable.rate,
        })
    }

    /// All qualifying factors, strongest absolute difference first.
    pub fn factor_correlations(&self, check_ins: &[CheckIn]) -> Vec<FactorCorrelation> {
        let mut out: Vec<FactorCorrelation> = Factor::ALL
            .iter()
            .filter_map(|f| match self.factor_correlation(check_ins, *f) {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::trace!(factor = f.as_str(), error = %e, "factor omitted");
                    None
                }
            })
            .collect();
        sort_by_strength(&mut out, |c| c.difference);
        out
    }

    /// Compare good-mood rates on days with and without an activity tag.
    ///
    /// # Errors
    /// `InsufficientData` when either arm is under `min_samples`.
    pub fn activity_correlation(
        &self,
        check_ins: &[CheckIn],
        activity: &str,
    ) -> Result<ActivityCorrelation> {
        let (with, without): (Vec<&CheckIn>, Vec<&CheckIn>) = check_ins
            .iter()
            .partition(|c| c.activities.iter().any(|a| a == activity));
        self.require(with.len().min(without.len()))?;

        let with_scores: Vec<u8> = with.iter().map(|c| c.mood_score()).collect();
        let without_scores: Vec<u8> = without.iter().map(|c| c.mood_score()).collect();
        let with = ArmStats::from_scores(&with_scores, self.good_mood_threshold);
        let without = ArmStats::from_scores(&without_scores, self.good_mood_threshold);
        Ok(ActivityCorrelation {
            activity: activity.to_string(),
            with,
            without,
            difference: with.rate - without.rate,
        })
    }

    /// Every tag seen in the history that qualifies, strongest first.
    pub fn activity_correlations(&self, check_ins: &[CheckIn]) -> Vec<ActivityCorrelation> {
        let tags: BTreeSet<&str> = check_ins
            .iter()
            .flat_map(|c| c.activities.iter().map(String::as_str))
            .collect();
        let mut out: Vec<ActivityCorrelation> = tags
            .into_iter()
            .filter_map(|tag| self.activity_correlation(check_ins, tag).ok())
            .collect();
        sort_by_strength(&mut out, |c| c.difference);
        out
    }

    fn require(&self, available: usize) -> Result<()> {
        if available < self.min_samples {
            return Err(CoreError::InsufficientData {
                needed: self.min_samples,
                available,
            });
        }
        Ok(())
    }
}

/// Stable sort by absolute effect, descending.
fn sort_by_strength<T>(items: &mut [T], effect: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| effect(b).abs().total_cmp(&effect(a).abs()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MoodLabel, StructuredFields};
    use chrono::{DateTime, Days, NaiveDate};

    fn check_in(n: u64, mood: MoodLabel, fields: StructuredFields, activities: &[&str]) -> CheckIn {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Days::new(n);
        CheckIn {
            id: format!("c{n}"),
            date,
            mood,
            happy_thing: String::new(),
            improve_thing: String::new(),
            fields,
            activities: activities.iter().map(|s| s.to_string()).collect(),
            ai_response: None,
            submitted_at: DateTime::parse_from_rfc3339(&format!("{date}T21:00:00+00:00")).unwrap(),
        }
    }

    fn sleep(level: Level) -> StructuredFields {
        StructuredFields {
            sleep: Some(level),
            ..Default::default()
        }
    }

    fn history(high: usize, low: usize) -> Vec<CheckIn> {
        let mut out = Vec::new();
        let mut n = 0;
        for i in 0..high {
            let mood = if i % 5 == 4 { MoodLabel::Okay } else { MoodLabel::Good };
            out.push(check_in(n, mood, sleep(Level::High), &[]));
            n += 1;
        }
        for i in 0..low {
            let mood = if i % 5 == 0 { MoodLabel::Good } else { MoodLabel::Bad };
            out.push(check_in(n, mood, sleep(Level::Low), &[]));
            n += 1;
        }
        out
    }

    #[test]
    fn reports_rates_for_both_arms() {
        let engine = CorrelationEngine::new();
        let c = engine.factor_correlation(&history(5, 5), Factor::Sleep).unwrap();
        assert_eq!(c.favorable.samples, 5);
        assert_eq!(c.favorable.good, 4);
        assert!((c.favorable.rate - 80.0).abs() < 1e-9);
        assert!((c.unfavorable.rate - 20.0).abs() < 1e-9);
        assert!((c.difference - 60.0).abs() < 1e-9);
    }

    #[test]
    fn omits_factor_below_threshold() {
        let engine = CorrelationEngine::new();
        let data = history(10, 4);
        assert!(matches!(
            engine.factor_correlation(&data, Factor::Sleep),
            Err(CoreError::InsufficientData { needed: 5, available: 4 })
        ));
        assert!(engine.factor_correlations(&data).is_empty());
    }

    #[test]
    fn medium_counts_for_neither_arm() {
        let engine = CorrelationEngine::new();
        let mut data = history(5, 5);
        data.push(check_in(99, MoodLabel::Amazing, sleep(Level::Medium), &[]));
        let c = engine.factor_correlation(&data, Factor::Sleep).unwrap();
        assert_eq!(c.data_points(), 10);
    }

    #[test]
    fn ranks_by_absolute_difference() {
        let engine = CorrelationEngine::new();
        let mut data = Vec::new();
        // Sleep: strong positive effect. Energy: weaker negative effect.
        for n in 0..5 {
            data.push(check_in(n, MoodLabel::Good, StructuredFields {
                sleep: Some(Level::High),
                energy: Some(Level::Low),
                ..Default::default()
            }, &[]));
        }
        for n in 5..10 {
            let mood = if n < 7 { MoodLabel::Good } else { MoodLabel::Bad };
            data.push(check_in(n, mood, StructuredFields {
                sleep: Some(Level::Low),
                energy: Some(Level::High),
                ..Default::default()
            }, &[]));
        }
        for n in 10..12 {
            data.push(check_in(n, MoodLabel::Good, StructuredFields {
                energy: Some(Level::High),
                ..Default::default()
            }, &[]));
        }
        let ranked = engine.factor_correlations(&data);
        let factors: Vec<Factor> = ranked.iter().map(|c| c.factor).collect();
        assert_eq!(factors, vec![Factor::Sleep, Factor::Energy]);
        assert!(ranked[1].difference < 0.0);
    }

    #[test]
    fn activity_arms_partition_history() {
        let engine = CorrelationEngine::new();
        let mut data = Vec::new();
        for n in 0..6 {
            data.push(check_in(n, MoodLabel::Amazing, StructuredFields::default(), &["exercise"]));
        }
        for n in 6..12 {
            data.push(check_in(n, MoodLabel::Okay, StructuredFields::default(), &["work"]));
        }
        let ranked = engine.activity_correlations(&data);
        assert_eq!(ranked.len(), 2);
        let exercise = ranked.iter().find(|c| c.activity == "exercise").unwrap();
        assert_eq!(exercise.with.samples, 6);
        assert_eq!(exercise.without.samples, 6);
        assert!((exercise.difference - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_yields_nothing() {
        let engine = CorrelationEngine::new();
        assert!(engine.factor_correlations(&[]).is_empty());
        assert!(engine.activity_correlations(&[]).is_empty());
    }
}
