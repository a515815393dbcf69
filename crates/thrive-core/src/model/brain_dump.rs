//! The daily reflection draft.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::analytics::unlock::{self, DraftMetrics};
use crate::error::ValidationError;

/// Date-scoped free-text draft. Derived fields are recomputed on every edit
/// and frozen once the day's check-in is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBrainDump {
    pub date: NaiveDate,
    pub text: String,
    pub goal_ids: BTreeSet<String>,
    pub word_count: usize,
    pub sentence_count: usize,
    pub progress_completion: f64,
    pub is_ai_chat_unlocked: bool,
    pub finalized: bool,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl DailyBrainDump {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            text: String::new(),
            goal_ids: BTreeSet::new(),
            word_count: 0,
            sentence_count: 0,
            progress_completion: 0.0,
            is_ai_chat_unlocked: false,
            finalized: false,
            updated_at: None,
        }
    }

    /// Replace the draft content and recompute derived fields.
    pub fn edit(
        &mut self,
        text: &str,
        goal_ids: BTreeSet<String>,
        at: DateTime<FixedOffset>,
    ) -> Result<DraftMetrics, ValidationError> {
        if self.finalized {
            return Err(ValidationError::DraftFinalized { date: self.date });
        }
        self.text = text.to_string();
        self.goal_ids = goal_ids;
        self.updated_at = Some(at);
        Ok(self.refresh())
    }

    /// Recompute derived fields from the stored text and tags.
    pub fn refresh(&mut self) -> DraftMetrics {
        let metrics = unlock::evaluate(&self.text, self.goal_ids.len());
        self.word_count = metrics.word_count;
        self.sentence_count = metrics.sentence_count;
        self.progress_completion = metrics.progress_completion;
        self.is_ai_chat_unlocked = metrics.is_ai_chat_unlocked;
        metrics
    }

    pub fn metrics(&self) -> DraftMetrics {
        DraftMetrics {
            word_count: self.word_count,
            sentence_count: self.sentence_count,
            progress_completion: self.progress_completion,
            is_ai_chat_unlocked: self.is_ai_chat_unlocked,
        }
    }
}
