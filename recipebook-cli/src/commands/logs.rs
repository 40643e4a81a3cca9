//! Logs command - inspect the event log by family

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, Utc};
use clap::Subcommand;
use colored::Colorize;
use comfy_table::Cell;

use recipebook_core::services::{EntryPoint, EventFamily, LogEntry, LogQuery, LoggingService};

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent events, newest first
    List {
        /// Only this family: auth, session, recipes, command or other
        #[arg(long)]
        family: Option<EventFamily>,
        /// Only events that carry an error
        #[arg(long)]
        errors: bool,
        /// Number of events to show
        #[arg(short = 'n', long, default_value = "30")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Event and error counts per family
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete events older than a number of days
    Clear {
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        /// Don't ask for confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let log = LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .context("Failed to open the event log")?;

    match command {
        LogsCommands::List {
            family,
            errors,
            limit,
            json,
        } => list(&log, family, errors, limit, json),
        LogsCommands::Stats { json } => stats(&log, json),
        LogsCommands::Clear { older_than_days, force } => clear(&log, older_than_days, force),
    }
}

fn local_time(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Short description of what the event was about
fn subject(entry: &LogEntry) -> String {
    match (&entry.command, &entry.view) {
        (Some(command), _) => format!("rb {}", command),
        (None, Some(view)) => format!("-> {}", view),
        (None, None) => String::new(),
    }
}

fn list(log: &LoggingService, family: Option<EventFamily>, errors: bool, limit: usize, json: bool) -> Result<()> {
    let mut query = if errors { LogQuery::errors(limit) } else { LogQuery::recent(limit) };
    if let Some(family) = family {
        query = query.in_family(family);
    }
    let entries = log.query(&query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        output::info("No matching events.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["When", "Family", "Event", "From", "About", "Error"]);
    for entry in &entries {
        let error = match (&entry.error_message, &entry.error_code) {
            (Some(message), Some(code)) => format!("{} ({})", message, code),
            (Some(message), None) => message.clone(),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(local_time(entry.logged_at_ms)),
            Cell::new(entry.family),
            Cell::new(&entry.event),
            Cell::new(&entry.entry_point),
            Cell::new(subject(entry)),
            Cell::new(error.red()),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn stats(log: &LoggingService, json: bool) -> Result<()> {
    let families = log.family_stats()?;
    let size_bytes = std::fs::metadata(log.db_path()).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "families": families,
                "databasePath": log.db_path().to_string_lossy(),
                "databaseSizeBytes": size_bytes,
            }))?
        );
        return Ok(());
    }

    if families.is_empty() {
        output::info("The event log is empty.");
    } else {
        let mut table = output::create_table();
        table.set_header(vec!["Family", "Events", "Errors", "Last event"]);
        for family in &families {
            let errors = if family.errors > 0 {
                family.errors.to_string().red().to_string()
            } else {
                "0".to_string()
            };
            table.add_row(vec![
                Cell::new(family.family),
                Cell::new(family.events),
                Cell::new(errors),
                Cell::new(local_time(family.last_logged_at_ms)),
            ]);
        }
        println!("{}", table);
    }
    println!(
        "{} {} ({})",
        "Database:".dimmed(),
        log.db_path().display(),
        output::format_size(size_bytes)
    );
    Ok(())
}

fn clear(log: &LoggingService, older_than_days: u32, force: bool) -> Result<()> {
    let cutoff = Duration::try_days(i64::from(older_than_days))
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .context("Cutoff date is out of range")?;

    if !force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete events logged before {}?", cutoff.with_timezone(&Local).format("%Y-%m-%d")))
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    let deleted = log.prune(cutoff.timestamp_millis())?;
    output::success(&format!("Deleted {} events", deleted));
    Ok(())
}
