pub mod checkin;
pub mod coach;
pub mod config;
pub mod draft;
pub mod goal;
pub mod habit;
pub mod insights;
pub mod milestone;
pub mod sprint;
pub mod task;

use chrono::NaiveDate;
use serde::Serialize;
use thrive_core::model::{Category, Level, Priority};
use thrive_core::{Config, Engine, Timeframe};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the engine against the configured data directory.
pub fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    Ok(Engine::open(config)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

pub fn parse_timeframe(value: &str) -> Result<Timeframe, String> {
    Timeframe::parse(value)
        .ok_or_else(|| format!("unknown timeframe '{value}' (week, month, quarter, year)"))
}

pub fn parse_level(value: &str) -> Result<Level, String> {
    Level::parse(value).ok_or_else(|| format!("unknown level '{value}' (low, medium, high)"))
}

pub fn parse_category(value: &str) -> Result<Category, String> {
    Ok(Category::parse(value))
}

pub fn parse_priority(value: &str) -> Result<Priority, String> {
    Ok(Priority::parse(value))
}
