//! Doctor command - validate configuration and show status

use anyhow::Result;
use image_relay_adapters::FileSeenStore;
use image_relay_domain::SeenStore;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    watch: CheckResult,
    reddit: CheckResult,
    telegram: CheckResult,
    seen_store: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let (config, config_check) = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => (config, CheckResult::ok("Configuration loaded")),
        Err(e) => (
            AppConfig::default(),
            CheckResult::error(format!("Failed to load configuration: {:#}", e)),
        ),
    };

    let report = DoctorReport {
        watch: check_watch(&config),
        reddit: check_reddit(&config),
        telegram: check_telegram(&config),
        seen_store: check_seen_store(&config).await,
        overall: String::new(),
        config: config_check,
    };

    let has_errors = [
        &report.config,
        &report.watch,
        &report.reddit,
        &report.telegram,
        &report.seen_store,
    ]
    .iter()
    .any(|check| check.is_error());

    let report = DoctorReport {
        overall: if has_errors {
            "issues found".to_string()
        } else {
            "ok".to_string()
        },
        ..report
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_check("config", &report.config);
        print_check("watch", &report.watch);
        print_check("reddit", &report.reddit);
        print_check("telegram", &report.telegram);
        print_check("seen_store", &report.seen_store);
        println!("\noverall: {}", report.overall);
    }

    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}

fn print_check(name: &str, check: &CheckResult) {
    println!("[{}] {}: {}", check.status, name, check.message);
}

fn check_watch(config: &AppConfig) -> CheckResult {
    if config.watch.author.trim().is_empty() {
        CheckResult::error("watch.author is not set")
    } else {
        CheckResult::ok(format!("Watching u/{}", config.watch.author))
    }
}

fn check_reddit(config: &AppConfig) -> CheckResult {
    match config.reddit.provider.trim() {
        "stub" => CheckResult::ok("Using stub post source"),
        "reddit" => {
            let mut missing = vec![];
            for env_name in [
                &config.reddit.client_id_env,
                &config.reddit.client_secret_env,
            ] {
                if std::env::var(env_name).map(|v| v.trim().is_empty()).unwrap_or(true) {
                    missing.push(env_name.clone());
                }
            }

            if missing.is_empty() {
                CheckResult::ok("Reddit credentials present")
            } else {
                CheckResult::error(format!(
                    "Missing environment variables: {}",
                    missing.join(", ")
                ))
            }
        }
        other => CheckResult::error(format!("Invalid post source provider: {}", other)),
    }
}

fn check_telegram(config: &AppConfig) -> CheckResult {
    if config.telegram.chat_id.trim().is_empty() {
        return CheckResult::error("telegram.chat_id is not set");
    }

    let token_present = std::env::var(&config.telegram.bot_token_env)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);

    if token_present {
        CheckResult::ok(format!("Bot token set, chat {}", config.telegram.chat_id))
    } else {
        CheckResult::error(format!(
            "Missing environment variable: {}",
            config.telegram.bot_token_env
        ))
    }
}

async fn check_seen_store(config: &AppConfig) -> CheckResult {
    let store = FileSeenStore::new(config.general.seen_file.clone());

    match store.load().await {
        Ok(ids) if ids.is_empty() && !config.general.seen_file.exists() => CheckResult::warn(
            format!(
                "Seen file {} does not exist yet (fresh start)",
                config.general.seen_file.display()
            ),
        ),
        Ok(ids) => CheckResult::ok(format!("{} post ids recorded", ids.len())),
        Err(e) => CheckResult::error(format!(
            "Failed to read {}: {}",
            config.general.seen_file.display(),
            e
        )),
    }
}
