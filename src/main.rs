use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use launchpad::config::LaunchConfig;
use launchpad::logging;

mod cmd;

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(version, about = "Resumable NFT campaign deployment orchestrator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Target network name (e.g. sepolia, base). Overrides launchpad.toml.
    #[arg(long, global = true, env = "LAUNCHPAD_NETWORK")]
    pub network: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a campaign, resuming from its last checkpoint
    Run {
        /// Campaign identifier
        campaign: String,
    },
    /// Show deployment progress for a campaign
    Status {
        campaign: String,
        /// Print the raw progress record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retry explorer verification for a deployed campaign
    Verify { campaign: String },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default launchpad.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // A missing .env is normal.
    let _ = dotenvy::from_path(project_dir.join(".env"));

    let config = LaunchConfig::new(project_dir)?.with_cli_args(cli.verbose, cli.network.as_deref());

    // Only commands that talk to collaborators write a log file.
    let log_dir = match cli.command {
        Commands::Config { .. } => None,
        _ => Some(config.log_dir()),
    };
    let _log_guard = logging::init(
        config.log_level(),
        cli.verbose,
        config.toml.logging.json,
        log_dir.as_deref(),
    )?;

    match &cli.command {
        Commands::Run { campaign } => cmd::cmd_run(&config, campaign).await?,
        Commands::Status { campaign, json } => cmd::cmd_status(&config, campaign, *json).await?,
        Commands::Verify { campaign } => cmd::cmd_verify(&config, campaign).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
