//! Goal management commands.

use clap::Subcommand;
use thrive_core::model::Category;
use thrive_core::NewGoal;

use super::{open_engine, parse_category, print_json, CliResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a 12-week goal starting today
    Create {
        /// Goal title
        title: String,
        /// Category (health, career, relationships, personal_growth, finance,
        /// creativity, mindfulness, other)
        #[arg(long, default_value = "other", value_parser = parse_category)]
        category: Category,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// List goals
    List {
        /// Include archived goals
        #[arg(long)]
        all: bool,
    },
    /// Progress and schedule status of a goal
    Progress {
        /// Goal ID
        id: String,
    },
    /// Daily progress since the goal was created
    History {
        /// Goal ID
        id: String,
    },
    /// Archive a goal
    Archive {
        /// Goal ID
        id: String,
    },
    /// Delete a goal that no sprint references
    Delete {
        /// Goal ID
        id: String,
    },
    /// Split the goal into three 4-week sprints
    Plan {
        /// Goal ID
        id: String,
    },
}

pub fn run(action: GoalAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        GoalAction::Create {
            title,
            category,
            description,
        } => {
            let mut input = NewGoal::new(title, category);
            input.description = description;
            print_json(&engine.create_goal(input)?)?;
        }
        GoalAction::List { all } => {
            print_json(&engine.list_goals(all)?)?;
        }
        GoalAction::Progress { id } => {
            print_json(&engine.goal_progress(&id)?)?;
        }
        GoalAction::History { id } => {
            print_json(&engine.goal_progress_history(&id)?)?;
        }
        GoalAction::Archive { id } => {
            print_json(&engine.archive_goal(&id)?)?;
        }
        GoalAction::Delete { id } => {
            engine.delete_goal(&id)?;
            println!("Goal deleted: {id}");
        }
        GoalAction::Plan { id } => {
            print_json(&engine.plan_sprints(&id)?)?;
        }
    }
    Ok(())
}
