//! Confidence-scored behavioral insights.
//!
//! All ranking heuristics live here as named thresholds. Confidence scales
//! with both sample size and effect size:
//!
//! ```text
//! confidence = min(1, data_points / sample_saturation) * normalized_effect
//! ```
//!
//! clamped to [0, 1]. Every insight keeps the counts it was derived from.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use super::correlation::{ActivityCorrelation, FactorCorrelation};
use super::progress::{GoalProgress, ScheduleStatus};
use super::streak::EngagementStats;
use super::window::ratio;
use crate::model::{CheckIn, ConfidenceBand, Goal, Insight, InsightMetadata, InsightType};

/// Observations at which sample-size confidence saturates.
pub const DEFAULT_SAMPLE_SATURATION: f64 = 30.0;
/// Percentage-point gap treated as a maximal correlation effect.
pub const CORRELATION_EFFECT_SATURATION: f64 = 50.0;
/// Smallest percentage-point gap worth reporting.
pub const MIN_REPORTABLE_DIFFERENCE: f64 = 10.0;
/// Days of history the trend and consistency insights look at.
pub const RECENT_WINDOW_DAYS: u64 = 28;
/// Check-ins needed in the recent window for a trend.
pub const MIN_TREND_SAMPLES: usize = 6;
/// Mean-mood change (scale points) required for a trend.
pub const MIN_TREND_DELTA: f64 = 0.3;
/// Mean-mood change treated as a maximal trend effect.
pub const TREND_EFFECT_SATURATION: f64 = 1.0;
/// Check-in days required before consistency is reported.
pub const MIN_CONSISTENCY_DAYS: u32 = 3;
/// Check-ins required before a time-of-day pattern is reported.
pub const MIN_TIME_OF_DAY_SAMPLES: usize = 7;
/// Share of check-ins one bucket must hold to be a pattern.
pub const MIN_TIME_OF_DAY_SHARE: f64 = 0.5;
/// Check-ins that must mention a word for it to count as a keyword.
pub const MIN_KEYWORD_MENTIONS: usize = 3;
/// Keywords kept in metadata.
pub const MAX_KEYWORDS: usize = 5;
/// Goal age before schedule momentum is judged.
pub const MIN_GOAL_AGE_DAYS: i64 = 7;
/// Days ahead/behind treated as a maximal momentum effect.
pub const MOMENTUM_EFFECT_SATURATION: f64 = 21.0;
/// Default number of insights returned.
pub const DEFAULT_INSIGHT_LIMIT: usize = 10;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "was", "were", "have", "had", "has", "but",
    "not", "are", "you", "your", "all", "got", "get", "out", "about", "just", "really", "very",
    "today", "day", "some", "from", "into", "then", "than", "when", "what", "been", "being",
    "our", "they", "them", "their", "there", "felt", "feel", "more", "much", "also", "like",
    "after", "before", "again", "it's", "i'm",
];

/// Everything the generator reads.
#[derive(Debug, Clone, Copy)]
pub struct InsightInput<'a> {
    pub check_ins: &'a [CheckIn],
    pub factors: &'a [FactorCorrelation],
    pub activities: &'a [ActivityCorrelation],
    pub engagement: EngagementStats,
    pub goals: &'a [(Goal, GoalProgress)],
    pub now: DateTime<FixedOffset>,
}

/// What an insight says and what it is about.
struct Headline<'a> {
    kind: InsightType,
    subject: &'a str,
    title: String,
    description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightGenerator {
    pub sample_saturation: f64,
    pub limit: usize,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self {
            sample_saturation: DEFAULT_SAMPLE_SATURATION,
            limit: DEFAULT_INSIGHT_LIMIT,
        }
    }
}

impl InsightGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(sample_saturation: f64, limit: usize) -> Self {
        Self {
            sample_saturation: sample_saturation.max(1.0),
            limit,
        }
    }

    /// `min(1, n / saturation) * effect`, clamped to [0, 1].
    pub fn confidence(&self, data_points: usize, normalized_effect: f64) -> f64 {
        let sample = (data_points as f64 / self.sample_saturation).min(1.0);
        (sample * normalized_effect.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }

    /// Generate and rank insights, highest confidence first.
    pub fn generate(&self, input: &InsightInput<'_>) -> Vec<Insight> {
        let mut out = Vec::new();
        out.extend(input.factors.iter().filter_map(|c| self.factor_insight(c, input.now)));
        out.extend(input.activities.iter().filter_map(|c| self.activity_insight(c, input.now)));
        out.extend(self.mood_trend(input));
        out.extend(self.consistency(input));
        out.extend(self.time_of_day(input));
        out.extend(self.keywords(input));
        out.extend(
            input
                .goals
                .iter()
                .filter_map(|(goal, progress)| self.goal_momentum(goal, progress, input.now)),
        );

        out.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(b.data_points.cmp(&a.data_points))
                .then(a.id.cmp(&b.id))
        });
        out.truncate(self.limit);
        out
    }

    fn build(
        &self,
        headline: Headline<'_>,
        data_points: usize,
        effect: f64,
        metadata: InsightMetadata,
        now: DateTime<FixedOffset>,
    ) -> Insight {
        let confidence = self.confidence(data_points, effect);
        Insight {
            id: format!("{}:{}", kind_key(headline.kind), headline.subject),
            kind: headline.kind,
            title: headline.title,
            description: headline.description,
            confidence,
            band: ConfidenceBand::for_score(confidence),
            data_points,
            metadata,
            generated_at: now,
        }
    }

    fn factor_insight(&self, c: &FactorCorrelation, now: DateTime<FixedOffset>) -> Option<Insight> {
        if c.difference.abs() < MIN_REPORTABLE_DIFFERENCE {
            return None;
        }
        let name = c.factor.as_str();
        let title = if c.difference > 0.0 {
            format!("Good {name} lifts your mood")
        } else {
            format!("High-{name} days tend to feel harder")
        };
        let description = format!(
            "On high-{name} days you felt good {:.0}% of the time, versus {:.0}% on \
             low-{name} days.",
            c.favorable.rate, c.unfavorable.rate
        );
        let mut metadata = InsightMetadata::default();
        metadata.frequencies.insert("favorable".into(), c.favorable.rate);
        metadata.frequencies.insert("unfavorable".into(), c.unfavorable.rate);
        Some(self.build(
            Headline {
                kind: InsightType::FactorCorrelation,
                subject: name,
                title,
                description,
            },
            c.data_points(),
            c.difference.abs() / CORRELATION_EFFECT_SATURATION,
            metadata,
            now,
        ))
    }

    fn activity_insight(
        &self,
        c: &ActivityCorrelation,
        now: DateTime<FixedOffset>,
    ) -> Option<Insight> {
        if c.difference.abs() < MIN_REPORTABLE_DIFFERENCE {
            return None;
        }
        let name = &c.activity;
        let title = if c.difference > 0.0 {
            format!("{} boosts your mood", capitalize(name))
        } else {
            format!("{} days weigh on your mood", capitalize(name))
        };
        let description = format!(
            "You felt good on {:.0}% of days with {name}, compared with {:.0}% without it.",
            c.with.rate, c.without.rate
        );
        let mut metadata = InsightMetadata::default();
        metadata.frequencies.insert("with".into(), c.with.rate);
        metadata.frequencies.insert("without".into(), c.without.rate);
        Some(self.build(
            Headline {
                kind: InsightType::ActivityBoost,
                subject: name,
                title,
                description,
            },
            c.data_points(),
            c.difference.abs() / CORRELATION_EFFECT_SATURATION,
            metadata,
            now,
        ))
    }

    fn mood_trend(&self, input: &InsightInput<'_>) -> Option<Insight> {
        let recent = recent(input.check_ins, input.now.date_naive());
        if recent.len() < MIN_TREND_SAMPLES {
            return None;
        }
        let (earlier, later) = recent.split_at(recent.len() / 2);
        let avg = |xs: &[&CheckIn]| {
            xs.iter().map(|c| c.mood_score() as f64).sum::<f64>() / xs.len() as f64
        };
        let good = |xs: &[&CheckIn]| {
            ratio(xs.iter().filter(|c| c.mood_score() >= 4).count(), xs.len()) * 100.0
        };
        let delta = avg(later) - avg(earlier);
        if delta.abs() < MIN_TREND_DELTA {
            return None;
        }
        let (title, direction) = if delta > 0.0 {
            ("Your mood is trending up", "up")
        } else {
            ("Your mood has dipped lately", "down")
        };
        let description = format!(
            "Your average mood moved from {:.1} to {:.1} over the last {} check-ins.",
            avg(earlier),
            avg(later),
            recent.len()
        );
        let mut metadata = InsightMetadata::default();
        metadata.frequencies.insert("earlier_good_rate".into(), good(earlier));
        metadata.frequencies.insert("recent_good_rate".into(), good(later));
        Some(self.build(
            Headline {
                kind: InsightType::MoodTrend,
                subject: direction,
                title: title.to_string(),
                description,
            },
            recent.len(),
            delta.abs() / TREND_EFFECT_SATURATION,
            metadata,
            input.now,
        ))
    }

    fn consistency(&self, input: &InsightInput<'_>) -> Option<Insight> {
        let stats = input.engagement;
        if stats.total_check_in_days < MIN_CONSISTENCY_DAYS {
            return None;
        }
        let today = input.now.date_naive();
        let first = input.check_ins.iter().map(|c| c.date).min()?;
        let window_days =
            ((today - first).num_days() + 1).clamp(1, RECENT_WINDOW_DAYS as i64) as usize;
        let days_in_window = recent_days(input.check_ins, today, window_days as u64);
        let rate = ratio(days_in_window, window_days);

        let title = if stats.current_streak >= MIN_CONSISTENCY_DAYS {
            format!("You're on a {}-day streak", stats.current_streak)
        } else {
            format!("You checked in {days_in_window} of the last {window_days} days")
        };
        let description = format!(
            "Current streak {} day(s), longest {} day(s), {:.0}% check-in rate recently.",
            stats.current_streak,
            stats.longest_streak,
            rate * 100.0
        );
        let mut metadata = InsightMetadata::default();
        metadata.frequencies.insert("check_in_rate".into(), rate * 100.0);
        Some(self.build(
            Headline {
                kind: InsightType::Consistency,
                subject: "check_ins",
                title,
                description,
            },
            window_days,
            rate,
            metadata,
            input.now,
        ))
    }

    fn time_of_day(&self, input: &InsightInput<'_>) -> Option<Insight> {
        if input.check_ins.len() < MIN_TIME_OF_DAY_SAMPLES {
            return None;
        }
        let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
        for c in input.check_ins {
            *buckets.entry(time_bucket(c.submitted_at.hour()).to_string()).or_insert(0) += 1;
        }
        let (top, count) = buckets
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(k, v)| (k.clone(), *v))?;
        let share = ratio(count, input.check_ins.len());
        if share < MIN_TIME_OF_DAY_SHARE {
            return None;
        }
        let description = format!(
            "{:.0}% of your check-ins happen in the {top}.",
            share * 100.0
        );
        let metadata = InsightMetadata {
            time_of_day: buckets,
            ..Default::default()
        };
        Some(self.build(
            Headline {
                kind: InsightType::TimeOfDay,
                subject: &top,
                title: format!("You usually reflect in the {top}"),
                description,
            },
            input.check_ins.len(),
            share,
            metadata,
            input.now,
        ))
    }

    fn keywords(&self, input: &InsightInput<'_>) -> Option<Insight> {
        let n = input.check_ins.len();
        let mut mentions: HashMap<String, usize> = HashMap::new();
        for c in input.check_ins {
            let words: HashSet<String> = tokenize(&c.happy_thing).collect();
            for w in words {
                *mentions.entry(w).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> = mentions
            .into_iter()
            .filter(|(_, count)| *count >= MIN_KEYWORD_MENTIONS)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(MAX_KEYWORDS);
        let (top, top_count) = ranked.first().cloned()?;

        let share = ratio(top_count, n);
        let mut metadata = InsightMetadata {
            keywords: ranked.iter().map(|(w, _)| w.clone()).collect(),
            ..Default::default()
        };
        for (w, count) in &ranked {
            metadata.frequencies.insert(w.clone(), ratio(*count, n) * 100.0);
        }
        Some(self.build(
            Headline {
                kind: InsightType::Keywords,
                subject: &top,
                title: format!("{} keeps showing up in your happy moments", capitalize(&top)),
                description: format!(
                    "You mentioned \"{top}\" in {top_count} of {n} check-ins when describing \
                     what made you happy."
                ),
            },
            n,
            share,
            metadata,
            input.now,
        ))
    }

    fn goal_momentum(
        &self,
        goal: &Goal,
        progress: &GoalProgress,
        now: DateTime<FixedOffset>,
    ) -> Option<Insight> {
        let age_days = (now.date_naive() - goal.created_on).num_days();
        if !goal.is_active() || age_days < MIN_GOAL_AGE_DAYS {
            return None;
        }
        let delta = progress.days_delta?;
        let data_points = progress.milestones_total + progress.tasks_total;
        let (title, description) = match progress.status {
            ScheduleStatus::Ahead => (
                format!("You're ahead on \"{}\"", goal.title),
                format!(
                    "About {delta} day(s) ahead of pace at {:.0}% complete.",
                    progress.percentage
                ),
            ),
            ScheduleStatus::Behind => (
                format!("\"{}\" needs attention", goal.title),
                format!(
                    "About {} day(s) behind pace: {:.0}% complete with {:.0}% of the time used.",
                    -delta, progress.percentage, progress.time_elapsed_percentage
                ),
            ),
            ScheduleStatus::OnTrack => return None,
        };
        let mut metadata = InsightMetadata::default();
        metadata.frequencies.insert("complete".into(), progress.percentage);
        metadata.frequencies.insert("time_elapsed".into(), progress.time_elapsed_percentage);
        Some(self.build(
            Headline {
                kind: InsightType::GoalMomentum,
                subject: &goal.id,
                title,
                description,
            },
            data_points.max(1),
            delta.unsigned_abs() as f64 / MOMENTUM_EFFECT_SATURATION,
            metadata,
            now,
        ))
    }
}

fn kind_key(kind: InsightType) -> &'static str {
    match kind {
        InsightType::MoodTrend => "mood_trend",
        InsightType::FactorCorrelation => "factor_correlation",
        InsightType::ActivityBoost => "activity_boost",
        InsightType::Consistency => "consistency",
        InsightType::TimeOfDay => "time_of_day",
        InsightType::Keywords => "keywords",
        InsightType::GoalMomentum => "goal_momentum",
    }
}

/// Check-ins from the recent window, oldest first.
fn recent(check_ins: &[CheckIn], today: NaiveDate) -> Vec<&CheckIn> {
    let start = today
        .checked_sub_days(Days::new(RECENT_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    let mut out: Vec<&CheckIn> = check_ins
        .iter()
        .filter(|c| c.date >= start && c.date <= today)
        .collect();
    out.sort_by_key(|c| c.date);
    out
}

fn recent_days(check_ins: &[CheckIn], today: NaiveDate, days: u64) -> usize {
    let start = today
        .checked_sub_days(Days::new(days.saturating_sub(1)))
        .unwrap_or(NaiveDate::MIN);
    check_ins
        .iter()
        .map(|c| c.date)
        .filter(|d| *d >= start && *d <= today)
        .collect::<HashSet<_>>()
        .len()
}

fn time_bucket(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=21 => "evening",
        _ => "night",
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::correlation::ArmStats;
    use crate::model::{Factor, MoodLabel, StructuredFields};

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-06-30T21:00:00+00:00").unwrap()
    }

    fn check_in(days_ago: u64, mood: MoodLabel, happy: &str, hour: u32) -> CheckIn {
        let date = now().date_naive() - Days::new(days_ago);
        CheckIn {
            id: format!("c{days_ago}"),
            date,
            mood,
            happy_thing: happy.to_string(),
            improve_thing: String::new(),
            fields: StructuredFields::default(),
            activities: Vec::new(),
            ai_response: None,
            submitted_at: DateTime::parse_from_rfc3339(&format!("{date}T{hour:02}:15:00+00:00"))
                .unwrap(),
        }
    }

    fn input<'a>(
        check_ins: &'a [CheckIn],
        factors: &'a [FactorCorrelation],
        engagement: EngagementStats,
    ) -> InsightInput<'a> {
        InsightInput {
            check_ins,
            factors,
            activities: &[],
            engagement,
            goals: &[],
            now: now(),
        }
    }

    fn arm(samples: usize, good: usize) -> ArmStats {
        ArmStats {
            samples,
            good,
            rate: good as f64 * 100.0 / samples as f64,
            mood_average: 3.0,
        }
    }

    #[test]
    fn confidence_scales_with_samples_and_effect() {
        let g = InsightGenerator::new();
        assert_eq!(g.confidence(0, 1.0), 0.0);
        assert!((g.confidence(15, 1.0) - 0.5).abs() < 1e-9);
        assert!((g.confidence(60, 0.7) - 0.7).abs() < 1e-9);
        assert_eq!(g.confidence(60, 3.0), 1.0);
    }

    #[test]
    fn empty_history_has_no_insights() {
        let g = InsightGenerator::new();
        let out = g.generate(&input(&[], &[], EngagementStats::default()));
        assert!(out.is_empty());
    }

    #[test]
    fn factor_insight_carries_rates() {
        let g = InsightGenerator::new();
        let factors = vec![FactorCorrelation {
            factor: Factor::Sleep,
            favorable: arm(20, 16),
            unfavorable: arm(10, 2),
            difference: 60.0,
        }];
        let out = g.generate(&input(&[], &factors, EngagementStats::default()));
        assert_eq!(out.len(), 1);
        let insight = &out[0];
        assert_eq!(insight.kind, InsightType::FactorCorrelation);
        assert_eq!(insight.id, "factor_correlation:sleep");
        assert_eq!(insight.data_points, 30);
        assert_eq!(insight.confidence, 1.0);
        assert_eq!(insight.band, ConfidenceBand::High);
        assert_eq!(insight.metadata.frequencies["favorable"], 80.0);
        assert_eq!(insight.metadata.frequencies["unfavorable"], 20.0);
    }

    #[test]
    fn weak_factor_difference_is_skipped() {
        let g = InsightGenerator::new();
        let factors = vec![FactorCorrelation {
            factor: Factor::Energy,
            favorable: arm(10, 5),
            unfavorable: arm(10, 5),
            difference: 0.0,
        }];
        assert!(g.generate(&input(&[], &factors, EngagementStats::default())).is_empty());
    }

    #[test]
    fn detects_upward_trend() {
        let g = InsightGenerator::new();
        let history: Vec<CheckIn> = (0..8u64)
            .map(|i| {
                let mood = if i < 4 { MoodLabel::Amazing } else { MoodLabel::Bad };
                check_in(i, mood, "", 20)
            })
            .collect();
        let out = g.generate(&input(&history, &[], EngagementStats::default()));
        let trend = out.iter().find(|i| i.kind == InsightType::MoodTrend).unwrap();
        assert_eq!(trend.id, "mood_trend:up");
        assert_eq!(trend.data_points, 8);
        assert_eq!(trend.metadata.frequencies["recent_good_rate"], 100.0);
    }

    #[test]
    fn evening_pattern_and_keywords() {
        let g = InsightGenerator::new();
        let history: Vec<CheckIn> = (0..8u64)
            .map(|i| {
                let happy = if i % 2 == 0 { "Dinner with family" } else { "Quiet walk" };
                check_in(i, MoodLabel::Good, happy, 19)
            })
            .collect();
        let out = g.generate(&input(&history, &[], EngagementStats::default()));

        let tod = out.iter().find(|i| i.kind == InsightType::TimeOfDay).unwrap();
        assert_eq!(tod.metadata.time_of_day["evening"], 8);
        assert_eq!(tod.title, "You usually reflect in the evening");

        let kw = out.iter().find(|i| i.kind == InsightType::Keywords).unwrap();
        assert!(kw.metadata.keywords.contains(&"family".to_string()));
        assert!(kw.metadata.keywords.contains(&"walk".to_string()));
        assert_eq!(kw.metadata.frequencies["family"], 50.0);
    }

    #[test]
    fn ranked_by_confidence_and_limited() {
        let g = InsightGenerator::with_settings(30.0, 1);
        let factors = vec![
            FactorCorrelation {
                factor: Factor::Energy,
                favorable: arm(5, 3),
                unfavorable: arm(5, 1),
                difference: 40.0,
            },
            FactorCorrelation {
                factor: Factor::Sleep,
                favorable: arm(15, 15),
                unfavorable: arm(15, 0),
                difference: 100.0,
            },
        ];
        let out = g.generate(&input(&[], &factors, EngagementStats::default()));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "factor_correlation:sleep");
    }

    #[test]
    fn consistency_reports_streak() {
        let g = InsightGenerator::new();
        let history: Vec<CheckIn> = (0..5u64)
            .map(|i| check_in(i, MoodLabel::Okay, "", 8))
            .collect();
        let stats = EngagementStats {
            current_streak: 5,
            longest_streak: 5,
            total_check_in_days: 5,
            last_check_in: Some(now().date_naive()),
        };
        let out = g.generate(&input(&history, &[], stats));
        let c = out.iter().find(|i| i.kind == InsightType::Consistency).unwrap();
        assert_eq!(c.title, "You're on a 5-day streak");
        assert_eq!(c.metadata.frequencies["check_in_rate"], 100.0);
    }
}
