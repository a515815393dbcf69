//! Daily check-in commands.

use clap::Subcommand;
use thrive_core::model::{Level, StructuredFields};
use thrive_core::{NewCheckIn, Timeframe};

use super::{open_engine, parse_level, parse_timeframe, print_json, CliResult};

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Submit today's check-in
    Submit {
        /// Mood label (awful, bad, okay, good, amazing) or 1-5
        mood: String,
        /// Something that made you happy
        #[arg(long, default_value = "")]
        happy: String,
        /// Something you'd like to improve
        #[arg(long, default_value = "")]
        improve: String,
        /// Energy level (low, medium, high)
        #[arg(long, value_parser = parse_level)]
        energy: Option<Level>,
        /// Sleep quality (low, medium, high)
        #[arg(long, value_parser = parse_level)]
        sleep: Option<Level>,
        /// Social connection (low, medium, high)
        #[arg(long, value_parser = parse_level)]
        social: Option<Level>,
        /// Comma-separated activity tags
        #[arg(long, value_delimiter = ',')]
        activities: Vec<String>,
    },
    /// List check-ins in a time window
    List {
        /// week, month, quarter or year
        #[arg(long, default_value = "week", value_parser = parse_timeframe)]
        timeframe: Timeframe,
    },
}

pub fn run(action: CheckinAction) -> CliResult {
    let engine = open_engine()?;

    match action {
        CheckinAction::Submit {
            mood,
            happy,
            improve,
            energy,
            sleep,
            social,
            activities,
        } => {
            let input = NewCheckIn::new(mood)
                .happy(happy)
                .improve(improve)
                .fields(StructuredFields {
                    energy,
                    sleep,
                    social,
                })
                .activities(activities);
            let check_in = engine.submit_check_in(input)?;
            print_json(&check_in)?;
        }
        CheckinAction::List { timeframe } => {
            print_json(&engine.check_ins(timeframe)?)?;
        }
    }
    Ok(())
}

pub fn engagement() -> CliResult {
    let engine = open_engine()?;
    print_json(&engine.engagement()?)
}
