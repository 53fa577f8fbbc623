use arcsim::ScenarioKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arcsim")]
#[command(about = "Ownership graph simulator for strong, weak and unowned references")]
#[command(long_about = "arcsim replays automatic reference counting scenarios:
• Strong references shared between several variables
• Strong reference cycles that leak
• Cycles broken with weak references
• Unowned references, valid and dangling
• Closures capturing self strongly or weakly")]
#[command(version)]
#[command(after_help = "EXAMPLES:
  arcsim list                          # Show the built-in scenarios
  arcsim run strongCycle               # Replay one scenario
  arcsim run --all --format json       # Replay everything as JSON
  arcsim script graph.json             # Replay a scenario script")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Log every retain and release
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for reports
    #[arg(short, long, global = true, default_value = "text")]
    pub format: Format,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the built-in scenarios
    List,

    /// Run built-in scenarios
    Run {
        /// Scenario to run
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        scenario: Option<ScenarioKind>,

        /// Run every built-in scenario
        #[arg(long)]
        all: bool,
    },

    /// Run a scenario script (JSON)
    Script {
        /// Path to the script file
        #[arg(help = "Path to a .json scenario script")]
        input: PathBuf,
    },

    /// Show version and model information
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    /// Colored event trace
    Text,
    /// Pretty-printed JSON report
    Json,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Text => write!(f, "text"),
            Format::Json => write!(f, "json"),
        }
    }
}
