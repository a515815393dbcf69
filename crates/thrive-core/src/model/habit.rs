//! Recurring habits logged by calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub title: String,
    pub goal_id: Option<String>,
    pub created_on: NaiveDate,
    pub archived: bool,
    /// Days the habit was done, ascending and unique.
    #[serde(default)]
    pub completions: Vec<NaiveDate>,
}
