use chrono::{NaiveDate, TimeZone, Utc};
use colored::Colorize;

use crate::adapters::logs::rotation_logger::FileRotationLog;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{KeywardenError, Result};
use crate::core::models::log_entry::{RotationLogEntry, RotationOutcome};
use crate::core::traits::rotation_log::RotationLog;

/// Execute the `keywarden log` command.
///
/// Displays the rotation history with optional filters for key name,
/// date, and entry count.
pub fn execute(key: Option<&str>, since: Option<&str>, last: Option<usize>) -> Result<()> {
    let state_dir = crate::cli::context::state_dir();
    let config = AppConfig::load_or_default(&state_dir)?;
    let log = FileRotationLog::new(state_dir.join(&config.keywarden.log_file));

    let since_dt = since.map(parse_since).transpose()?;
    let entries = log.query(key, since_dt)?;

    if entries.is_empty() {
        output::header("keywarden log");
        output::warning("No rotation entries found");
        if key.is_some() || since.is_some() {
            println!("  Try removing filters to see all entries.");
        }
        return Ok(());
    }

    // Apply --last N (take from the end)
    let display: Vec<&RotationLogEntry> = match last {
        Some(n) => entries
            .iter()
            .rev()
            .take(n)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect(),
        None => entries.iter().collect(),
    };

    output::header(&format!("keywarden log ({} entries)", display.len()));
    println!();

    for entry in &display {
        print_entry(entry);
    }

    Ok(())
}

/// Parse a date string (ISO 8601: `YYYY-MM-DD`) into a UTC DateTime.
fn parse_since(s: &str) -> Result<chrono::DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| KeywardenError::InvalidConfig {
            detail: format!(
                "Invalid date format: '{s}'. Expected ISO 8601 (YYYY-MM-DD), e.g. 2026-01-15"
            ),
        })
        .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).expect("midnight is always valid")))
}

/// Print a single rotation entry as a formatted row.
fn print_entry(entry: &RotationLogEntry) {
    let date = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let outcome = format_outcome(entry.outcome);
    let steps = format!("{} steps", entry.steps_completed.len());
    let notes = if entry.warnings.is_empty() {
        entry.detail.clone().unwrap_or_default()
    } else {
        entry.warnings.join("; ")
    };

    println!(
        "  {} {} {:<8} {:<24} {} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        outcome,
        entry.key,
        steps.dimmed(),
        notes.dimmed(),
    );
}

/// Format a RotationOutcome as a colored string.
fn format_outcome(outcome: RotationOutcome) -> String {
    match outcome {
        RotationOutcome::Success => "ok".green().to_string(),
        RotationOutcome::Partial => "partial".yellow().to_string(),
        RotationOutcome::Failed => "failed".red().to_string(),
    }
}
