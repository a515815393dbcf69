//! Reflection gate for the AI coach.
//!
//! Maps a reflection draft to a 0-1 completion score and an unlock flag.
//! The score is a weighted sum of three saturating terms, so appending text
//! or adding goal tags can never lower it.

use serde::{Deserialize, Serialize};

/// Sentences required before the coach chat unlocks.
pub const MIN_SENTENCES_FOR_UNLOCK: usize = 2;

/// Words at which the word term saturates.
pub const WORD_TARGET: usize = 50;

/// Share of the score earned by reaching the sentence minimum.
pub const SENTENCE_WEIGHT: f64 = 0.5;
/// Share of the score earned by reaching the word target.
pub const WORD_WEIGHT: f64 = 0.3;
/// Share of the score earned by tagging at least one goal.
pub const GOAL_TAG_WEIGHT: f64 = 0.2;

const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '…'];

/// Derived values for a draft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DraftMetrics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub progress_completion: f64,
    pub is_ai_chat_unlocked: bool,
}

/// Whitespace-delimited tokens containing at least one letter or digit.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Fragments between terminal punctuation that contain a letter or digit.
/// A trailing unterminated fragment counts.
pub fn sentence_count(text: &str) -> usize {
    text.split(|c| SENTENCE_TERMINATORS.contains(&c))
        .filter(|frag| frag.chars().any(char::is_alphanumeric))
        .count()
}

/// Score a draft. Pure and deterministic.
pub fn evaluate(text: &str, goal_tags: usize) -> DraftMetrics {
    let words = word_count(text);
    let sentences = sentence_count(text);

    let sentence_term =
        sentences.min(MIN_SENTENCES_FOR_UNLOCK) as f64 / MIN_SENTENCES_FOR_UNLOCK as f64;
    let word_term = words.min(WORD_TARGET) as f64 / WORD_TARGET as f64;
    let goal_term = if goal_tags > 0 { 1.0 } else { 0.0 };

    let progress = (SENTENCE_WEIGHT * sentence_term
        + WORD_WEIGHT * word_term
        + GOAL_TAG_WEIGHT * goal_term)
        .clamp(0.0, 1.0);

    DraftMetrics {
        word_count: words,
        sentence_count: sentences,
        progress_completion: progress,
        is_ai_chat_unlocked: sentences >= MIN_SENTENCES_FOR_UNLOCK,
    }
}
