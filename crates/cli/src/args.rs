//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// image-relay: forward new image posts from a watched account to a chat
#[derive(Parser, Debug)]
#[command(name = "image-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the watched account and forward new images
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),

    /// Inspect the persisted seen-set
    Seen(SeenArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run in dry-run mode (no downloads or deliveries)
    #[arg(long)]
    pub dry_run: bool,

    /// Process one poll cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SeenArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
