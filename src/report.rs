//! # Report Rendering
//!
//! Terminal and JSON renderings of scenario reports.

use colored::*;
use std::fmt::Write;

use crate::runtime::{Event, EventKind};
use crate::scenarios::{Outcome, ScenarioReport};

pub fn render_event(event: &Event) -> String {
    match event.kind {
        EventKind::Initialized => format!("  {} {}", "+".bright_green(), event.to_string().green()),
        EventKind::Deinitialized => format!("  {} {}", "-".bright_red(), event.to_string().red()),
    }
}

pub fn render_text(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "▶".bright_cyan(), report.scenario.bold());

    for event in &report.events {
        let _ = writeln!(out, "{}", render_event(event));
    }
    for note in &report.notes {
        let _ = writeln!(out, "  {} {}", "·".bright_blue(), note.dimmed());
    }

    match &report.outcome {
        Outcome::Completed => {
            let _ = writeln!(out, "{} completed", "✓".green());
        }
        Outcome::Failed { error } => {
            let _ = writeln!(out, "{} {}", "✗ failed:".bright_red().bold(), error);
        }
    }

    if !report.leaked.is_empty() {
        let _ = writeln!(
            out,
            "{} still live: {}",
            "⚠".yellow(),
            report.leaked.join(", ").bright_yellow()
        );
    }

    let stats = report.stats;
    let _ = writeln!(
        out,
        "  {}",
        format!(
            "{} allocated, {} retains, {} releases, {} deallocated",
            stats.allocations, stats.retains, stats.releases, stats.deallocations
        )
        .dimmed()
    );
    out
}

pub fn render_json(reports: &[ScenarioReport]) -> serde_json::Result<String> {
    match reports {
        [single] => serde_json::to_string_pretty(single),
        many => serde_json::to_string_pretty(many),
    }
}
