//! SnapWatch CLI - Command-line interface for SnapWatch
//!
//! Provides commands for:
//! - Authentication with OneDrive (device code flow)
//! - Browsing drive folders to pick monitored paths
//! - Running a manual backup check
//! - Testing Telegram delivery
//! - Managing the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use snapwatch_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod session;

use commands::{
    auth::AuthCommand, check::CheckCommand, completions::CompletionsCommand,
    config::ConfigCommand, folders::FoldersCommand, notify::NotifyTestCommand,
};
use output::{Output, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "snapwatch",
    version,
    about = "Daily backup snapshot monitor for OneDrive"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// List drive folders and their IDs
    Folders(FoldersCommand),
    /// Run one backup check now
    Check(CheckCommand),
    /// Send a test message to the configured Telegram chat
    NotifyTest(NotifyTestCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    let result = match &cli.command {
        Commands::Auth(cmd) => cmd.execute(&config_path, format).await,
        Commands::Folders(cmd) => cmd.execute(&config_path, format).await,
        Commands::Check(cmd) => cmd.execute(&config_path, format).await,
        Commands::NotifyTest(cmd) => cmd.execute(&config_path, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
        Commands::Completions(cmd) => cmd.execute(format).await,
    };

    if let Err(e) = result {
        Output::new(format).error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
