mod cli;

use anyhow::{anyhow, Context, Result};
use arcsim::report::{render_json, render_text};
use arcsim::scenarios::run_all;
use arcsim::{ScenarioDriver, ScenarioKind, ScenarioReport, Script};
use clap::Parser;
use colored::*;
use tracing::{info, Level};

use crate::cli::{Args, Commands, Format};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::List => list_scenarios(),
        Commands::Run { scenario, all } => run_scenarios(scenario, all, args.format),
        Commands::Script { input } => run_script(&input, args.format),
        Commands::Info => show_info(),
    }
}

fn list_scenarios() -> Result<()> {
    for kind in ScenarioKind::ALL {
        println!("{} {}", format!("{:<24}", kind.name()).bright_cyan(), kind.description());
    }
    Ok(())
}

fn run_scenarios(scenario: Option<ScenarioKind>, all: bool, format: Format) -> Result<()> {
    let reports = match scenario {
        Some(kind) if !all => vec![ScenarioDriver::new().run(kind)],
        _ => run_all(),
    };
    info!(count = reports.len(), format = %format, "scenarios finished");
    emit(&reports, format)
}

fn run_script(input: &std::path::Path, format: Format) -> Result<()> {
    info!("Running script {}", input.display());
    let script = Script::from_path(input)?;
    let report = script
        .run(ScenarioDriver::new())
        .with_context(|| format!("script '{}' could not be executed", script.name))?;
    emit(std::slice::from_ref(&report), format)
}

fn emit(reports: &[ScenarioReport], format: Format) -> Result<()> {
    match format {
        Format::Text => {
            for report in reports {
                println!("{}", render_text(report));
            }
        }
        Format::Json => println!("{}", render_json(reports)?),
    }

    let failed = reports.iter().filter(|r| !r.outcome.is_completed()).count();
    if failed > 0 && reports.len() == 1 {
        return Err(anyhow!("Scenario {} failed", reports[0].scenario));
    }
    Ok(())
}

fn show_info() -> Result<()> {
    println!("{}", "arcsim".bright_cyan().bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Reference kinds:");
    println!("  {} strong  - counted, keeps the target alive", "●".green());
    println!("  {} weak    - not counted, reads nil once the target is gone", "○".bright_blue());
    println!("  {} unowned - not counted, reading a gone target is an error", "◌".bright_yellow());
    println!();
    println!("Deallocation is depth-first and eager. Strong cycles are never collected.");
    Ok(())
}
