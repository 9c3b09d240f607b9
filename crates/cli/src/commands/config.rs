//! Config command - configuration management

use anyhow::{Context, Result, bail};
use std::path::Path;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init(&path, force).await,
    }
}

async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
    }

    tokio::fs::write(path, AppConfig::example_toml())
        .await
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Wrote example configuration to {}", path.display());

    Ok(())
}
