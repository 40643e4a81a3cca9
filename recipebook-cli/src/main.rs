//! Recipe Book CLI - recipes and a shopping list in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::auth::{self, AuthMode};
use commands::{config, logs, recipes, shell};

/// Recipe Book - recipes and a shopping list in your terminal
#[derive(Parser)]
#[command(name = "rb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Signup {
        /// E-mail address (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
        /// Password (prompted if omitted)
        #[arg(long, env = "RECIPEBOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in with e-mail and password
    Login {
        /// E-mail address (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
        /// Password (prompted if omitted)
        #[arg(long, env = "RECIPEBOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log out and forget the stored session
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current session
    Session {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch and list the stored recipes
    Recipes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive session
    Shell,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Signup { email, password, json } => auth::run(AuthMode::Signup, email, password, json).await,
        Commands::Login { email, password, json } => auth::run(AuthMode::Login, email, password, json).await,
        Commands::Logout { json } => auth::run_logout(json),
        Commands::Session { json } => auth::run_session(json),
        Commands::Recipes { json } => recipes::run(json).await,
        Commands::Shell => shell::run().await,
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
