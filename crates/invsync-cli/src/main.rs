//! Invsync CLI - replicate a store's inventory between the cloud database
//! and its local backup.

mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::load_sync_settings;
use crate::commands::config::run_config;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32, CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("invsync=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { command } => {
            let settings = load_sync_settings(cli.profile.as_deref(), cli.db_path)?;
            let outcome = run_sync(&command, &settings).await?;
            Ok(outcome.exit_code())
        }
        Commands::Config { command } => {
            run_config(command, cli.profile.as_deref(), cli.db_path)?;
            Ok(0)
        }
    }
}
