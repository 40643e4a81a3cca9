//! CLI command implementations

pub mod auth;
pub mod config;
pub mod logs;
pub mod recipes;
pub mod shell;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use recipebook_core::services::{EntryPoint, LogEvent, LoggingService};
use recipebook_core::RecipeBookContext;

/// Environment variable overriding the data directory
const DATA_DIR_ENV: &str = "RECIPEBOOK_DIR";

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".recipebook"))
        .context("Could not find home directory; set RECIPEBOOK_DIR")
}

/// Get the logging service for commands that run without a context
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Create the context for commands that talk to the backend
pub fn get_context(entry_point: EntryPoint) -> Result<RecipeBookContext> {
    let data_dir = get_data_dir()?;
    RecipeBookContext::new(&data_dir, entry_point).context("Failed to initialize recipe book")
}

/// Create the context for commands that only read or clear the stored session
pub fn get_local_context(entry_point: EntryPoint) -> Result<RecipeBookContext> {
    let data_dir = get_data_dir()?;
    RecipeBookContext::local(&data_dir, entry_point).context("Failed to initialize recipe book")
}

/// Record which command ran
pub fn log_command(ctx: &RecipeBookContext, command: &str) {
    ctx.log(LogEvent::new("command_executed").with_command(command));
}

/// Spinner shown while waiting on the network; hidden when stderr isn't a terminal
pub fn spinner(message: &str) -> ProgressBar {
    if atty::isnt(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
