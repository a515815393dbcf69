use chrono::NaiveDate;
use clap::Subcommand;

use super::{open_engine, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum MilestoneAction {
    /// Add a milestone to a goal
    Add {
        /// Goal ID
        goal: String,
        /// Milestone title
        title: String,
        /// Target date (YYYY-MM-DD, default: the goal's target date)
        #[arg(long, value_parser = parse_date)]
        target: Option<NaiveDate>,
        /// Sprint the milestone belongs to
        #[arg(long)]
        sprint: Option<String>,
    },
    /// Complete a milestone (cannot be undone)
    Complete {
        /// Milestone ID
        id: String,
    },
}

pub fn run(action: MilestoneAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        MilestoneAction::Add {
            goal,
            title,
            target,
            sprint,
        } => {
            let milestone = engine.add_milestone(&goal, &title, target, sprint.as_deref())?;
            print_json(&milestone)?;
        }
        MilestoneAction::Complete { id } => {
            print_json(&engine.complete_milestone(&id)?)?;
        }
    }
    Ok(())
}
