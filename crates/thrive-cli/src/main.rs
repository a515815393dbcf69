use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use thrive_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "thrive", version, about = "Thrive wellbeing tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily check-ins
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Check-in streaks
    Engagement,
    /// Ranked behavioral insights
    Insights,
    /// 12-week goals
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// 4-week sprints
    Sprint {
        #[command(subcommand)]
        action: commands::sprint::SprintAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Goal milestones
    Milestone {
        #[command(subcommand)]
        action: commands::milestone::MilestoneAction,
    },
    /// Habit tracking
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Today's reflection draft
    Draft {
        #[command(subcommand)]
        action: commands::draft::DraftAction,
    },
    /// Aggregates over a time window
    Summary {
        /// week, month, quarter or year
        #[arg(default_value = "week", value_parser = commands::parse_timeframe)]
        timeframe: thrive_core::Timeframe,
    },
    /// Ask the AI coach about today's reflection
    Coach(commands::coach::CoachArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = Config::load_or_default().logging.level;
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"))
    });
    // A second init in the same process is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Checkin { action } => commands::checkin::run(action),
        Commands::Engagement => commands::checkin::engagement(),
        Commands::Insights => commands::insights::run(),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Sprint { action } => commands::sprint::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Milestone { action } => commands::milestone::run(action),
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Draft { action } => commands::draft::run(action),
        Commands::Summary { timeframe } => commands::insights::summary(timeframe),
        Commands::Coach(args) => commands::coach::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "thrive", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
