//! Task management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use thrive_core::model::{Category, Priority};
use thrive_core::NewTask;

use super::{open_engine, parse_category, parse_date, parse_priority, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Sprint to add the task to
        #[arg(long)]
        sprint: Option<String>,
        /// Priority (low, medium, high)
        #[arg(long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
        /// Category
        #[arg(long, default_value = "other", value_parser = parse_category)]
        category: Category,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
    },
    /// Mark a task as completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Mark a completed task as open again
    Reopen {
        /// Task ID
        id: String,
    },
    /// List tasks
    List {
        /// Only tasks in this sprint
        #[arg(long)]
        sprint: Option<String>,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        TaskAction::Add {
            title,
            sprint,
            priority,
            category,
            due,
        } => {
            let mut input = NewTask::new(title).priority(priority);
            input.category = category;
            input.sprint_id = sprint;
            if let Some(due) = due {
                input = input.due(due);
            }
            print_json(&engine.add_task(input)?)?;
        }
        TaskAction::Complete { id } => {
            print_json(&engine.complete_task(&id)?)?;
        }
        TaskAction::Reopen { id } => {
            print_json(&engine.reopen_task(&id)?)?;
        }
        TaskAction::List { sprint } => {
            let tasks = match sprint {
                Some(sprint_id) => engine.tasks_for_sprint(&sprint_id)?,
                None => engine.list_tasks()?,
            };
            print_json(&tasks)?;
        }
    }
    Ok(())
}
