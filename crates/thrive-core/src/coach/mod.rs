//! The AI coach boundary.
//!
//! The coach is an external collaborator: it receives structured context
//! and returns opaque text. Calls are awaitable and cancellable, and every
//! failure is absorbed here by substituting a static fallback message.
//!
//! Callers must persist the draft before asking for a reply. A dropped or
//! cancelled call then loses nothing.

mod http;

pub use http::HttpCoach;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::CoachError;

/// Shown when the coach cannot answer.
pub const DEFAULT_FALLBACK: &str = "Thanks for taking a moment to reflect today. \
Showing up for yourself is what matters, and your notes are saved. \
Check back later for a fuller response.";

/// Check-in summary included in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptCheckIn {
    pub date: NaiveDate,
    pub mood: String,
    pub happy_thing: String,
    pub improve_thing: String,
}

/// Goal summary included in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptGoal {
    pub title: String,
    pub category: String,
    pub percentage: f64,
    pub on_track: bool,
}

/// Structured context handed to the coach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachPrompt {
    pub date: NaiveDate,
    pub recent_check_ins: Vec<PromptCheckIn>,
    pub active_goals: Vec<PromptGoal>,
    pub draft: String,
    /// Titles of goals the draft was tagged with.
    pub tagged_goals: Vec<String>,
}

impl CoachPrompt {
    pub fn system_message(&self) -> String {
        indoc! {"
            You are a warm, practical wellbeing coach. Reply in at most three short
            paragraphs. Reflect back one thing the person did well, connect today's
            notes to their goals where it fits, and suggest one small next step.
            Never diagnose and never give medical advice."}
        .to_string()
    }

    pub fn user_message(&self) -> String {
        let check_ins = if self.recent_check_ins.is_empty() {
            "- none yet".to_string()
        } else {
            self.recent_check_ins
                .iter()
                .map(|c| {
                    format!(
                        "- {} mood {}: happy about \"{}\", would improve \"{}\"",
                        c.date, c.mood, c.happy_thing, c.improve_thing
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        let goals = if self.active_goals.is_empty() {
            "- none".to_string()
        } else {
            self.active_goals
                .iter()
                .map(|g| {
                    format!(
                        "- {} ({}): {:.0}% complete, {}",
                        g.title,
                        g.category,
                        g.percentage,
                        if g.on_track { "on track" } else { "behind" }
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        let tagged = if self.tagged_goals.is_empty() {
            "none".to_string()
        } else {
            self.tagged_goals.join(", ")
        };

        formatdoc! {"
            Date: {date}

            Recent check-ins:
            {check_ins}

            Active goals:
            {goals}

            Today's reflection (tagged goals: {tagged}):
            {draft}",
            date = self.date,
            draft = self.draft.trim(),
        }
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Coach,
    Fallback,
    /// The caller gave up. Nothing should be recorded.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachReply {
    pub text: String,
    pub source: ReplySource,
}

/// An AI coach that turns structured context into a reply.
#[async_trait]
pub trait AiCoach: Send + Sync {
    async fn respond(&self, prompt: &CoachPrompt) -> Result<String, CoachError>;
}

/// Ask the coach for a reply, bounded by `timeout` and `cancel`.
///
/// Never fails: errors and timeouts produce `fallback` with
/// [`ReplySource::Fallback`]. Cancellation wins over a reply that arrives
/// at the same moment.
pub async fn request_reply(
    coach: &dyn AiCoach,
    prompt: &CoachPrompt,
    timeout: Duration,
    cancel: &CancellationToken,
    fallback: &str,
) -> CoachReply {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CoachError::Cancelled),
        result = tokio::time::timeout(timeout, coach.respond(prompt)) => match result {
            Ok(reply) => reply,
            Err(_) => Err(CoachError::Timeout { secs: timeout.as_secs() }),
        },
    };

    match outcome {
        Ok(text) if !text.trim().is_empty() => {
            tracing::debug!(chars = text.len(), "coach replied");
            CoachReply {
                text: text.trim().to_string(),
                source: ReplySource::Coach,
            }
        }
        Ok(_) => fallback_reply(CoachError::MalformedReply, fallback),
        Err(CoachError::Cancelled) => {
            tracing::debug!("coach request cancelled");
            CoachReply {
                text: String::new(),
                source: ReplySource::Cancelled,
            }
        }
        Err(e) => fallback_reply(e, fallback),
    }
}

fn fallback_reply(error: CoachError, fallback: &str) -> CoachReply {
    tracing::warn!(%error, "coach unavailable, using fallback message");
    CoachReply {
        text: fallback.to_string(),
        source: ReplySource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl AiCoach for Canned {
        async fn respond(&self, _prompt: &CoachPrompt) -> Result<String, CoachError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl AiCoach for Failing {
        async fn respond(&self, _prompt: &CoachPrompt) -> Result<String, CoachError> {
            Err(CoachError::Network("connection refused".into()))
        }
    }

    struct Slow;

    #[async_trait]
    impl AiCoach for Slow {
        async fn respond(&self, _prompt: &CoachPrompt) -> Result<String, CoachError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn prompt() -> CoachPrompt {
        CoachPrompt {
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            recent_check_ins: vec![PromptCheckIn {
                date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
                mood: "good".into(),
                happy_thing: "Long walk".into(),
                improve_thing: "Sleep earlier".into(),
            }],
            active_goals: vec![PromptGoal {
                title: "Run a 10k".into(),
                category: "health".into(),
                percentage: 40.0,
                on_track: true,
            }],
            draft: "Ran 3k today. Legs are sore.\n".into(),
            tagged_goals: vec!["Run a 10k".into()],
        }
    }

    #[test]
    fn user_message_includes_context() {
        let msg = prompt().user_message();
        assert!(msg.starts_with("Date: 2026-04-01"));
        assert!(msg.contains("- 2026-03-31 mood good: happy about \"Long walk\""));
        assert!(msg.contains("- Run a 10k (health): 40% complete, on track"));
        assert!(msg.contains("tagged goals: Run a 10k"));
        assert!(msg.ends_with("Ran 3k today. Legs are sore."));
    }

    #[test]
    fn empty_context_is_explicit() {
        let mut p = prompt();
        p.recent_check_ins.clear();
        p.active_goals.clear();
        p.tagged_goals.clear();
        let msg = p.user_message();
        assert!(msg.contains("Recent check-ins:\n- none yet"));
        assert!(msg.contains("Active goals:\n- none"));
        assert!(msg.contains("tagged goals: none"));
    }

    #[tokio::test]
    async fn successful_reply_is_passed_through() {
        let reply = request_reply(
            &Canned("  Great work!  "),
            &prompt(),
            Duration::from_secs(5),
            &CancellationToken::new(),
            DEFAULT_FALLBACK,
        )
        .await;
        assert_eq!(reply.source, ReplySource::Coach);
        assert_eq!(reply.text, "Great work!");
    }

    #[tokio::test]
    async fn failure_falls_back() {
        let reply = request_reply(
            &Failing,
            &prompt(),
            Duration::from_secs(5),
            &CancellationToken::new(),
            "fallback",
        )
        .await;
        assert_eq!(reply.source, ReplySource::Fallback);
        assert_eq!(reply.text, "fallback");
    }

    #[tokio::test]
    async fn blank_reply_falls_back() {
        let reply = request_reply(
            &Canned("   "),
            &prompt(),
            Duration::from_secs(5),
            &CancellationToken::new(),
            "fallback",
        )
        .await;
        assert_eq!(reply.source, ReplySource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back() {
        let reply = request_reply(
            &Slow,
            &prompt(),
            Duration::from_secs(30),
            &CancellationToken::new(),
            "fallback",
        )
        .await;
        assert_eq!(reply.source, ReplySource::Fallback);
    }

    #[tokio::test]
    async fn cancellation_records_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let reply = request_reply(
            &Canned("hi"),
            &prompt(),
            Duration::from_secs(5),
            &cancel,
            "fallback",
        )
        .await;
        assert_eq!(reply.source, ReplySource::Cancelled);
        assert!(reply.text.is_empty());
    }
}
