//! Ask the AI coach about today's reflection.
//!
//! The draft is already stored before the request goes out. Ctrl-C cancels
//! the pending call and nothing is recorded.

use std::time::Duration;

use clap::Args;
use serde_json::json;
use thrive_core::{request_reply, CoachReply, HttpCoach, ReplySource};
use tokio_util::sync::CancellationToken;

use super::{open_engine, print_json, CliResult};

#[derive(Args)]
pub struct CoachArgs {
    /// Seconds to wait for a reply (default: coach.timeout_secs)
    #[arg(long)]
    timeout: Option<u64>,
}

pub fn run(args: CoachArgs) -> CliResult {
    let engine = open_engine()?;
    let prompt = engine.coach_prompt()?;
    let coach_config = engine.config().coach.clone();
    let timeout = Duration::from_secs(args.timeout.unwrap_or(coach_config.timeout_secs));

    let reply = match HttpCoach::from_config(&coach_config) {
        Ok(coach) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let cancel = CancellationToken::new();
                let on_interrupt = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        on_interrupt.cancel();
                    }
                });
                let fallback = coach_config.fallback_message.as_str();
                request_reply(&coach, &prompt, timeout, &cancel, fallback).await
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "coach unavailable, using fallback message");
            CoachReply {
                text: coach_config.fallback_message.clone(),
                source: ReplySource::Fallback,
            }
        }
    };

    let recorded = match reply.source {
        ReplySource::Coach => engine.record_coach_reply(prompt.date, &reply.text)?,
        ReplySource::Fallback | ReplySource::Cancelled => false,
    };

    print_json(&json!({
        "reply": reply,
        "recorded": recorded,
    }))
}
