use chrono::NaiveDate;
use clap::Subcommand;

use super::{open_engine, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum SprintAction {
    /// Create a 4-week sprint
    Create {
        /// Sprint title
        title: String,
        /// Goal the sprint belongs to
        #[arg(long)]
        goal: Option<String>,
        /// Start date (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Week number within the goal (default: derived from the start date)
        #[arg(long)]
        week: Option<u32>,
    },
    /// Progress, days remaining and overdue state
    Status {
        /// Sprint ID
        id: String,
    },
    /// List sprints
    List {
        /// Only sprints of this goal
        #[arg(long)]
        goal: Option<String>,
    },
}

pub fn run(action: SprintAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        SprintAction::Create {
            title,
            goal,
            start,
            week,
        } => {
            let sprint = engine.create_sprint(goal.as_deref(), &title, start, week)?;
            print_json(&sprint)?;
        }
        SprintAction::Status { id } => {
            print_json(&engine.sprint_status(&id)?)?;
        }
        SprintAction::List { goal } => {
            print_json(&engine.list_sprints(goal.as_deref())?)?;
        }
    }
    Ok(())
}
