use thrive_core::Timeframe;

use super::{open_engine, print_json, CliResult};

pub fn run() -> CliResult {
    let engine = open_engine()?;
    print_json(&engine.active_insights()?)
}

pub fn summary(timeframe: Timeframe) -> CliResult {
    let engine = open_engine()?;
    print_json(&engine.window_summary(timeframe)?)
}
