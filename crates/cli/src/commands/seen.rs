//! Seen command - inspect the persisted seen-set

use anyhow::{Context, Result};
use image_relay_adapters::FileSeenStore;
use image_relay_domain::SeenStore;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::SeenArgs;
use crate::config::AppConfig;

#[derive(Serialize)]
struct SeenReport {
    path: String,
    count: usize,
    ids: Vec<String>,
}

pub async fn execute(args: SeenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let store = FileSeenStore::new(config.general.seen_file.clone());
    let ids = store
        .load()
        .await
        .with_context(|| format!("Failed to read {}", config.general.seen_file.display()))?;

    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort();

    if args.json {
        let report = SeenReport {
            path: config.general.seen_file.display().to_string(),
            count: ids.len(),
            ids,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} post ids in {}",
            ids.len(),
            config.general.seen_file.display()
        );
        for id in ids {
            println!("{}", id);
        }
    }

    Ok(())
}
