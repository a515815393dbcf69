//! Reflection draft commands.

use chrono::NaiveDate;
use clap::Subcommand;

use super::{open_engine, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum DraftAction {
    /// Replace today's draft text
    Update {
        /// Full draft text
        text: String,
        /// Goal IDs the draft relates to
        #[arg(long = "goal")]
        goals: Vec<String>,
    },
    /// Show a day's draft
    Show {
        /// Day (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: DraftAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        DraftAction::Update { text, goals } => {
            print_json(&engine.update_brain_dump_draft(&text, goals)?)?;
        }
        DraftAction::Show { date } => {
            let date = date.unwrap_or_else(|| engine.today());
            print_json(&engine.brain_dump(date)?)?;
        }
    }
    Ok(())
}
