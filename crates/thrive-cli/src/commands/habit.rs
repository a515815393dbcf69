use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;

use super::{open_engine, parse_date, print_json, CliResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Create {
        /// Habit title
        title: String,
        /// Goal the habit supports
        #[arg(long)]
        goal: Option<String>,
    },
    /// Log a habit for a day
    Log {
        /// Habit ID
        id: String,
        /// Day to log (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List habits with their streaks
    List,
}

pub fn run(action: HabitAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        HabitAction::Create { title, goal } => {
            print_json(&engine.create_habit(&title, goal.as_deref())?)?;
        }
        HabitAction::Log { id, date } => {
            let logged = engine.log_habit(&id, date)?;
            print_json(&json!({
                "habit_id": id,
                "date": date.unwrap_or_else(|| engine.today()),
                "logged": logged,
            }))?;
        }
        HabitAction::List => {
            print_json(&engine.habit_streaks()?)?;
        }
    }
    Ok(())
}
