//! Run command - the poll-dedup-forward loop

use anyhow::{Context, Result, bail};
use image_relay_adapters::{FileSeenStore, HttpImageFetcher, RedditPostSource, StubPostSource, TelegramPhotoSink};
use image_relay_domain::{
    DeliveryResult, PostSource,
    usecases::{Relay, RelayConfig},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval, sleep};

use crate::args::RunArgs;
use crate::config::{AppConfig, load_secret_env};

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let dry_run = args.dry_run || config.general.dry_run;

    if config.watch.author.trim().is_empty() {
        bail!("watch.author must be set (the account to relay from)");
    }

    tracing::info!(
        author = %config.watch.author,
        poll_interval_secs = config.watch.poll_interval_secs,
        max_posts_per_check = config.watch.max_posts_per_check,
        dry_run = dry_run,
        once = args.once,
        "Starting image-relay run"
    );

    // Build dependencies
    let source = build_post_source(&config)?;
    let fetcher = Arc::new(HttpImageFetcher::new());
    let sink = Arc::new(build_photo_sink(&config, dry_run)?);
    let seen_store = Arc::new(FileSeenStore::new(config.general.seen_file.clone()));

    let relay_config = RelayConfig {
        author: config.watch.author.clone(),
        max_posts_per_check: config.watch.max_posts_per_check,
        work_dir: config.general.work_dir.clone(),
        delivery_pause: Duration::from_secs(config.watch.delivery_pause_secs),
        dry_run,
    };

    let relay = Relay::new(source, fetcher, sink, seen_store, relay_config);

    if args.once {
        tracing::info!("Running single poll cycle");
        let report = relay.poll_once().await?;

        for (post_id, outcome) in &report.outcomes {
            match outcome {
                DeliveryResult::Delivered => {
                    tracing::info!(post_id = %post_id, "Delivered");
                }
                DeliveryResult::Skipped => {
                    tracing::info!(post_id = %post_id, "Skipped (dry run)");
                }
                DeliveryResult::DownloadFailed | DeliveryResult::SendFailed => {
                    tracing::error!(post_id = %post_id, outcome = ?outcome, "Failed");
                }
            }
        }

        tracing::info!(
            new_posts = report.new_posts(),
            delivered = report.delivered(),
            "Poll cycle complete"
        );

        return Ok(());
    }

    // Continuous polling loop with a bounded restart guard: a failed cycle is
    // retried after a delay, but back-to-back failures eventually stop the
    // process instead of restarting forever.
    let poll_interval = Duration::from_secs(config.watch.poll_interval_secs);
    let restart_delay = Duration::from_secs(config.general.restart_delay_secs);
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Set up graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Shutdown signal received");
    };

    tokio::pin!(shutdown);

    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match relay.poll_once().await {
                    Ok(report) => {
                        consecutive_failures = 0;
                        if report.new_posts() > 0 {
                            tracing::info!(
                                new_posts = report.new_posts(),
                                delivered = report.delivered(),
                                "Poll cycle complete"
                            );
                        }
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        tracing::error!(
                            error = %e,
                            consecutive_failures = consecutive_failures,
                            "Poll cycle failed"
                        );

                        if consecutive_failures >= config.general.max_consecutive_failures {
                            bail!(
                                "Giving up after {} consecutive failed cycles",
                                consecutive_failures
                            );
                        }

                        tracing::info!(
                            delay_secs = restart_delay.as_secs(),
                            "Retrying after delay"
                        );
                        sleep(restart_delay).await;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    tracing::info!("image-relay run completed");
    Ok(())
}

fn build_post_source(config: &AppConfig) -> Result<Arc<dyn PostSource>> {
    match config.reddit.provider.trim() {
        "reddit" => {
            let client_id = std::env::var(&config.reddit.client_id_env).with_context(|| {
                format!(
                    "Missing environment variable {} (reddit)",
                    config.reddit.client_id_env
                )
            })?;
            let client_secret = load_secret_env(&config.reddit.client_secret_env, "reddit")?;

            Ok(Arc::new(RedditPostSource::new(
                client_id,
                client_secret,
                config.reddit.user_agent.clone(),
            )))
        }
        "stub" => Ok(Arc::new(StubPostSource::empty())),
        other => bail!("Invalid post source provider: {}", other),
    }
}

fn build_photo_sink(config: &AppConfig, dry_run: bool) -> Result<TelegramPhotoSink> {
    if dry_run {
        return Ok(TelegramPhotoSink::disabled());
    }

    if config.telegram.chat_id.trim().is_empty() {
        bail!("telegram.chat_id must be set (the destination chat)");
    }

    let bot_token = load_secret_env(&config.telegram.bot_token_env, "telegram")?;

    Ok(TelegramPhotoSink::new(
        bot_token,
        config.telegram.chat_id.clone(),
    ))
}
