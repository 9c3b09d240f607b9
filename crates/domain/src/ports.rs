//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::model::ImagePost;

/// Error type for post source operations
#[derive(Debug, Error)]
pub enum PostSourceError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for fetching recent image posts from a source platform
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch up to `limit` most recent posts by `author`, newest first,
    /// keeping only posts with a usable image
    async fn fetch_recent(
        &self,
        author: &str,
        limit: usize,
    ) -> Result<Vec<ImagePost>, PostSourceError>;
}

/// Error type for image downloads
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for downloading an image to a local path
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download `url` into `dest`, replacing any existing file.
    /// On failure no partial file is left at `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Error type for photo delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for pushing a photo to the destination chat
#[async_trait]
pub trait PhotoSink: Send + Sync {
    /// Upload the file at `path` as a photo, with no caption
    async fn send_photo(&self, path: &Path) -> Result<(), DeliveryError>;
}

/// Error type for seen-set persistence
#[derive(Debug, Error)]
pub enum SeenStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for persisting the set of already-forwarded post ids
///
/// The seen-set only ever grows; `save` rewrites the full set.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Load all seen ids; an absent store yields an empty set
    async fn load(&self) -> Result<HashSet<String>, SeenStoreError>;

    /// Persist the full set, replacing previous contents
    async fn save(&self, ids: &HashSet<String>) -> Result<(), SeenStoreError>;
}
