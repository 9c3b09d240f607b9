//! Relay use case - one poll cycle of fetch, diff, deliver, persist

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::model::{CycleReport, DeliveryResult, ImagePost};
use crate::ports::{ImageFetcher, PhotoSink, PostSource, PostSourceError, SeenStore};

/// Configuration for the relay loop
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Account to watch
    pub author: String,
    /// Maximum posts fetched per cycle
    pub max_posts_per_check: usize,
    /// Directory for temporary image downloads
    pub work_dir: PathBuf,
    /// Pause between deliveries within one cycle
    pub delivery_pause: Duration,
    /// Dry run mode (don't download or send, still mark seen)
    pub dry_run: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            author: String::new(),
            max_posts_per_check: 10,
            work_dir: std::env::temp_dir(),
            delivery_pause: Duration::from_secs(1),
            dry_run: false,
        }
    }
}

/// Relay orchestrator
///
/// Runs one cycle at a time: fetch recent image posts, diff against the
/// persisted seen-set, deliver the unseen ones oldest-first, persist the
/// updated set. Per-call failures (download, send, load, save) are logged
/// and contained so one bad post never stops the batch.
#[derive(Clone)]
pub struct Relay<S, F, K, St>
where
    S: PostSource + ?Sized,
    F: ImageFetcher + ?Sized,
    K: PhotoSink + ?Sized,
    St: SeenStore + ?Sized,
{
    source: Arc<S>,
    fetcher: Arc<F>,
    sink: Arc<K>,
    seen_store: Arc<St>,
    config: RelayConfig,
}

impl<S, F, K, St> Relay<S, F, K, St>
where
    S: PostSource + ?Sized,
    F: ImageFetcher + ?Sized,
    K: PhotoSink + ?Sized,
    St: SeenStore + ?Sized,
{
    pub fn new(
        source: Arc<S>,
        fetcher: Arc<F>,
        sink: Arc<K>,
        seen_store: Arc<St>,
        config: RelayConfig,
    ) -> Self {
        Self {
            source,
            fetcher,
            sink,
            seen_store,
            config,
        }
    }

    /// Run a single poll cycle
    ///
    /// Only an authentication failure from the post source escapes as an
    /// error; retrying bad credentials at the poll cadence is pointless, so
    /// that case is left to the caller's restart guard. Everything else
    /// degrades to "nothing new this cycle".
    pub async fn poll_once(&self) -> Result<CycleReport, RelayError> {
        let mut seen = match self.seen_store.load().await {
            Ok(seen) => seen,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load seen-set, starting from empty");
                HashSet::new()
            }
        };

        let posts = match self
            .source
            .fetch_recent(&self.config.author, self.config.max_posts_per_check)
            .await
        {
            Ok(posts) => posts,
            Err(e @ PostSourceError::Auth(_)) => return Err(RelayError::Source(e)),
            Err(e) => {
                tracing::error!(author = %self.config.author, error = %e, "Failed to fetch posts");
                vec![]
            }
        };

        // Mark ids seen before delivery, so a crash mid-batch cannot cause
        // redelivery on the next cycle. Upstream order (newest first) is kept.
        let new_posts: Vec<ImagePost> = posts
            .into_iter()
            .filter(|post| seen.insert(post.id.clone()))
            .collect();

        if new_posts.is_empty() {
            tracing::debug!(author = %self.config.author, "No new posts");
        } else {
            tracing::info!(
                author = %self.config.author,
                count = new_posts.len(),
                "Found new image posts"
            );
        }

        let mut report = CycleReport::default();

        // Deliver in reverse so the chat receives posts in chronological order
        for post in new_posts.iter().rev() {
            let outcome = if self.config.dry_run {
                tracing::info!(
                    post_id = %post.id,
                    image_url = %post.image_url,
                    "[DRY RUN] Would forward image"
                );
                DeliveryResult::Skipped
            } else {
                self.deliver(post).await
            };

            report.outcomes.push((post.id.clone(), outcome));

            if !self.config.delivery_pause.is_zero() {
                sleep(self.config.delivery_pause).await;
            }
        }

        if let Err(e) = self.seen_store.save(&seen).await {
            tracing::warn!(error = %e, "Failed to save seen-set, dedup progress lost");
        }

        Ok(report)
    }

    /// Download one post's image to a temp path and push it to the sink
    async fn deliver(&self, post: &ImagePost) -> DeliveryResult {
        let dest = self.config.work_dir.join(format!("relay-{}.jpg", post.id));

        let outcome = match self.fetcher.download(&post.image_url, &dest).await {
            Err(e) => {
                tracing::error!(
                    post_id = %post.id,
                    title = %post.title,
                    error = %e,
                    "Failed to download image"
                );
                DeliveryResult::DownloadFailed
            }
            Ok(()) => match self.sink.send_photo(&dest).await {
                Ok(()) => {
                    tracing::info!(post_id = %post.id, title = %post.title, "Forwarded image");
                    DeliveryResult::Delivered
                }
                Err(e) => {
                    tracing::error!(post_id = %post.id, error = %e, "Failed to send photo");
                    DeliveryResult::SendFailed
                }
            },
        };

        // Best-effort temp cleanup
        let _ = tokio::fs::remove_file(&dest).await;

        outcome
    }
}

/// Errors escaping a poll cycle
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Post source error: {0}")]
    Source(PostSourceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DeliveryError, FetchError, SeenStoreError};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeSource {
        posts: Vec<ImagePost>,
        error: Option<fn() -> PostSourceError>,
    }

    impl FakeSource {
        fn with_posts(posts: Vec<ImagePost>) -> Self {
            Self { posts, error: None }
        }

        fn failing(error: fn() -> PostSourceError) -> Self {
            Self {
                posts: vec![],
                error: Some(error),
            }
        }
    }

    #[async_trait]
    impl PostSource for FakeSource {
        async fn fetch_recent(
            &self,
            _author: &str,
            _limit: usize,
        ) -> Result<Vec<ImagePost>, PostSourceError> {
            match self.error {
                Some(make) => Err(make()),
                None => Ok(self.posts.clone()),
            }
        }
    }

    struct FakeFetcher {
        fail_urls: Vec<String>,
        downloads: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                fail_urls: vec![],
                downloads: Mutex::new(vec![]),
            }
        }

        fn failing_for(urls: &[&str]) -> Self {
            Self {
                fail_urls: urls.iter().map(|s| s.to_string()).collect(),
                downloads: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
            if self.fail_urls.iter().any(|u| u == url) {
                return Err(FetchError::Status(404));
            }
            tokio::fs::write(dest, b"fake image bytes").await?;
            self.downloads.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct FakeSink {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeSink {
        fn new() -> Self {
            Self {
                sent: Mutex::new(vec![]),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(vec![]),
                fail: true,
            }
        }

        fn sent_files(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PhotoSink for FakeSink {
        async fn send_photo(&self, path: &Path) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Api("sink down".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push(path.file_name().unwrap().to_string_lossy().into_owned());
            Ok(())
        }
    }

    struct FakeSeenStore {
        ids: Mutex<HashSet<String>>,
        fail_load: bool,
    }

    impl FakeSeenStore {
        fn new() -> Self {
            Self {
                ids: Mutex::new(HashSet::new()),
                fail_load: false,
            }
        }

        fn with_ids(ids: &[&str]) -> Self {
            Self {
                ids: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
                fail_load: false,
            }
        }

        fn saved(&self) -> HashSet<String> {
            self.ids.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SeenStore for FakeSeenStore {
        async fn load(&self) -> Result<HashSet<String>, SeenStoreError> {
            if self.fail_load {
                return Err(SeenStoreError::Io(std::io::Error::other("load failed")));
            }
            Ok(self.ids.lock().unwrap().clone())
        }

        async fn save(&self, ids: &HashSet<String>) -> Result<(), SeenStoreError> {
            *self.ids.lock().unwrap() = ids.clone();
            Ok(())
        }
    }

    fn post(id: &str) -> ImagePost {
        ImagePost {
            id: id.to_string(),
            title: format!("title {}", id),
            image_url: format!("https://img.example/{}.jpg", id),
        }
    }

    fn test_config(work_dir: &TempDir) -> RelayConfig {
        RelayConfig {
            author: "watched_user".to_string(),
            work_dir: work_dir.path().to_path_buf(),
            delivery_pause: Duration::ZERO,
            ..RelayConfig::default()
        }
    }

    fn relay(
        source: Arc<FakeSource>,
        fetcher: Arc<FakeFetcher>,
        sink: Arc<FakeSink>,
        store: Arc<FakeSeenStore>,
        config: RelayConfig,
    ) -> Relay<FakeSource, FakeFetcher, FakeSink, FakeSeenStore> {
        Relay::new(source, fetcher, sink, store, config)
    }

    #[tokio::test]
    async fn end_to_end_single_post() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore::new());

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("x")])),
            Arc::new(FakeFetcher::new()),
            Arc::clone(&sink),
            Arc::clone(&store),
            test_config(&dir),
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.new_posts(), 1);
        assert_eq!(report.delivered(), 1);
        assert_eq!(sink.sent_files(), vec!["relay-x.jpg"]);
        assert!(store.saved().contains("x"));
    }

    #[tokio::test]
    async fn delivers_oldest_first() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore::new());

        // Source returns newest first
        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![
                post("p3"),
                post("p2"),
                post("p1"),
            ])),
            Arc::new(FakeFetcher::new()),
            Arc::clone(&sink),
            store,
            test_config(&dir),
        );

        relay.poll_once().await.unwrap();

        assert_eq!(
            sink.sent_files(),
            vec!["relay-p1.jpg", "relay-p2.jpg", "relay-p3.jpg"]
        );
    }

    #[tokio::test]
    async fn already_seen_posts_are_not_redelivered() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore::with_ids(&["a", "b"]));

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("a"), post("b")])),
            Arc::new(FakeFetcher::new()),
            Arc::clone(&sink),
            Arc::clone(&store),
            test_config(&dir),
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.new_posts(), 0);
        assert!(sink.sent_files().is_empty());
        assert_eq!(store.saved().len(), 2);
    }

    #[tokio::test]
    async fn second_cycle_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore::new());

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("x"), post("y")])),
            Arc::new(FakeFetcher::new()),
            Arc::clone(&sink),
            Arc::clone(&store),
            test_config(&dir),
        );

        let first = relay.poll_once().await.unwrap();
        let saved_after_first = store.saved();
        let second = relay.poll_once().await.unwrap();

        assert_eq!(first.new_posts(), 2);
        assert_eq!(second.new_posts(), 0);
        assert_eq!(sink.sent_files().len(), 2);
        assert_eq!(store.saved(), saved_after_first);
    }

    #[tokio::test]
    async fn one_failed_download_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore::new());

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![
                post("c"),
                post("b"),
                post("a"),
            ])),
            Arc::new(FakeFetcher::failing_for(&["https://img.example/b.jpg"])),
            Arc::clone(&sink),
            Arc::clone(&store),
            test_config(&dir),
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.new_posts(), 3);
        assert_eq!(report.delivered(), 2);
        assert_eq!(sink.sent_files(), vec!["relay-a.jpg", "relay-c.jpg"]);
        assert!(
            report
                .outcomes
                .iter()
                .any(|(id, r)| id == "b" && *r == DeliveryResult::DownloadFailed)
        );

        // No temp files left behind, failed or not
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_post_is_still_marked_seen() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FakeSeenStore::new());

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("z")])),
            Arc::new(FakeFetcher::failing_for(&["https://img.example/z.jpg"])),
            Arc::new(FakeSink::new()),
            Arc::clone(&store),
            test_config(&dir),
        );

        relay.poll_once().await.unwrap();

        assert!(store.saved().contains("z"));
    }

    #[tokio::test]
    async fn send_failure_is_contained_and_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FakeSeenStore::new());

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("s")])),
            Arc::new(FakeFetcher::new()),
            Arc::new(FakeSink::failing()),
            Arc::clone(&store),
            test_config(&dir),
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.outcomes, vec![("s".to_string(), DeliveryResult::SendFailed)]);
        assert!(store.saved().contains("s"));

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty_cycle() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FakeSeenStore::with_ids(&["kept"]));

        let relay = relay(
            Arc::new(FakeSource::failing(|| {
                PostSourceError::Network("connection refused".to_string())
            })),
            Arc::new(FakeFetcher::new()),
            Arc::new(FakeSink::new()),
            Arc::clone(&store),
            test_config(&dir),
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.new_posts(), 0);
        assert!(store.saved().contains("kept"));
    }

    #[tokio::test]
    async fn auth_failure_escapes_the_cycle() {
        let dir = TempDir::new().unwrap();

        let relay = relay(
            Arc::new(FakeSource::failing(|| {
                PostSourceError::Auth("bad credentials".to_string())
            })),
            Arc::new(FakeFetcher::new()),
            Arc::new(FakeSink::new()),
            Arc::new(FakeSeenStore::new()),
            test_config(&dir),
        );

        let result = relay.poll_once().await;

        assert!(matches!(
            result,
            Err(RelayError::Source(PostSourceError::Auth(_)))
        ));
    }

    #[tokio::test]
    async fn dry_run_marks_seen_without_sending() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore::new());

        let config = RelayConfig {
            dry_run: true,
            ..test_config(&dir)
        };

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("d")])),
            Arc::new(FakeFetcher::new()),
            Arc::clone(&sink),
            Arc::clone(&store),
            config,
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.new_posts(), 1);
        assert_eq!(report.delivered(), 0);
        assert!(sink.sent_files().is_empty());
        assert!(store.saved().contains("d"));
        assert_eq!(report.outcomes[0].1, DeliveryResult::Skipped);
    }

    #[tokio::test]
    async fn unreadable_seen_store_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(FakeSink::new());
        let store = Arc::new(FakeSeenStore {
            ids: Mutex::new(HashSet::new()),
            fail_load: true,
        });

        let relay = relay(
            Arc::new(FakeSource::with_posts(vec![post("n")])),
            Arc::new(FakeFetcher::new()),
            Arc::clone(&sink),
            Arc::clone(&store),
            test_config(&dir),
        );

        let report = relay.poll_once().await.unwrap();

        assert_eq!(report.new_posts(), 1);
        assert_eq!(sink.sent_files(), vec!["relay-n.jpg"]);
    }
}
