//! Colored terminal output for notifications and state summaries.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::engine::{format_credits, ReconciledState};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Indent continuation lines so multi-line messages stay aligned under the tag.
#[must_use]
pub fn indent_continuation(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines().collect::<Vec<_>>().join(&format!("\n{pad}"))
}

/// Print a notification delivered to the console.
pub fn print_notification(text: &str) {
    let ts = timestamp();
    // timestamp, space, "[NOTIFY]", space
    let width = ts.len() + 10;
    println!(
        "{} {} {}",
        ts.dimmed(),
        "[NOTIFY]".yellow().bold(),
        indent_continuation(text, width)
    );
    let _ = io::stdout().flush();
}

/// Print the journal the locator selected.
pub fn print_journal(path: &Path) {
    println!("{} {}", "[JOURNAL]".cyan().bold(), path.display());
    let _ = io::stdout().flush();
}

/// Print the counters of a reconstructed state.
pub fn print_state_summary(journal: &Path, state: &ReconciledState) {
    println!("{} {}", "[JOURNAL]".cyan().bold(), journal.display());
    println!(
        "  {} {}",
        "Active missions:".bold(),
        state.active_missions.green()
    );
    println!(
        "  {} {}",
        "Tracked missions:".bold(),
        state.logged_missions.len()
    );
    println!(
        "  {} {}",
        "Pirates killed:".bold(),
        state.killed_pirates.green()
    );
    println!(
        "  {} {} credits",
        "Bounty rewards:".bold(),
        format_credits(state.total_pirate_reward).green()
    );
    println!(
        "  {} {} credits",
        "Mission rewards:".bold(),
        format_credits(state.total_mission_reward).green()
    );
    match state.last_missions_snapshot {
        Some(at) => println!("  {} {}", "Missions snapshot:".bold(), at.dimmed()),
        None => println!("  {} {}", "Missions snapshot:".bold(), "none".dimmed()),
    }
    let _ = io::stdout().flush();
}

/// Print an error line to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
