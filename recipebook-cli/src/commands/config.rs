//! Config command - show and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use recipebook_core::config::Config;
use recipebook_core::services::LogEvent;

use super::{get_data_dir, get_logger, log_event};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting (apiKey, identityUrl, recipesUrl)
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
}

/// Show only enough of the key to recognise it
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let prefix: String = key.chars().take(4).collect();
    format!("{}…", prefix)
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let logger = get_logger();

    match command {
        ConfigCommands::Show { json } => {
            log_event(&logger, LogEvent::new("command_executed").with_command("config show"));
            let config = Config::load(&data_dir)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "apiKey": mask_key(&config.api_key),
                        "identityUrl": config.identity_url,
                        "recipesUrl": config.recipes_url,
                        "dataDir": data_dir.to_string_lossy(),
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            println!("  apiKey: {}", mask_key(&config.api_key));
            println!("  identityUrl: {}", config.identity_url);
            println!("  recipesUrl: {}", config.recipes_url);
            println!("  Data directory: {}", data_dir.display());
        }
        ConfigCommands::Set { key, value } => {
            log_event(&logger, LogEvent::new("command_executed").with_command("config set"));
            let mut config = Config::load(&data_dir)?;
            config.set(&key, &value)?;
            config.save(&data_dir)?;
            println!("{} {} updated", "Success!".green(), key);
        }
    }

    Ok(())
}
