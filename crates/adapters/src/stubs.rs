//! Stub adapters for tests and offline runs

use async_trait::async_trait;
use image_relay_domain::{DeliveryError, ImagePost, PhotoSink, PostSource, PostSourceError};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stub post source returning a canned batch
pub struct StubPostSource {
    posts: Vec<ImagePost>,
}

impl StubPostSource {
    /// Create an empty stub
    pub fn empty() -> Self {
        Self { posts: vec![] }
    }

    /// Create a stub with predefined posts (newest first)
    pub fn with_posts(posts: Vec<ImagePost>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl PostSource for StubPostSource {
    async fn fetch_recent(
        &self,
        _author: &str,
        limit: usize,
    ) -> Result<Vec<ImagePost>, PostSourceError> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }
}

/// Photo sink that records sent paths instead of talking to a platform
pub struct RecordingPhotoSink {
    sent: Mutex<Vec<PathBuf>>,
}

impl RecordingPhotoSink {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
        }
    }

    /// Paths of all photos sent so far
    pub fn sent(&self) -> Vec<PathBuf> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for RecordingPhotoSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoSink for RecordingPhotoSink {
    async fn send_photo(&self, path: &Path) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
