//! Domain models and value objects

use serde::{Deserialize, Serialize};

/// A normalized upstream submission, before image classification
///
/// Adapters map the platform-specific wire shape into this value object so
/// that image extraction stays a pure function over one type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    /// Platform-specific submission ID
    pub id: String,
    /// Submission title
    pub title: String,
    /// Whether this is a self/text post (no external link)
    pub is_self: bool,
    /// Primary link URL
    pub url: String,
    /// Canonical source URL of the first preview image, if any
    pub preview_url: Option<String>,
    /// Gallery entries in their stored order, if this is a gallery post
    pub gallery: Vec<GalleryEntry>,
}

/// One entry of a gallery submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    /// Media type tag as reported upstream (e.g. "Image")
    pub kind: String,
    /// URL of the media item
    pub url: String,
}

/// Where a submission's image URL came from
///
/// Produced by [`crate::extract::classify_image`]; submissions classified as
/// `NoImage` are dropped before they ever reach the relay loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// First preview image's canonical source URL
    Preview(String),
    /// The submission's primary link points directly at an image file
    DirectLink(String),
    /// First gallery entry with an image media type
    Gallery(String),
    /// No usable image in any of the known shapes
    NoImage,
}

impl ImageSource {
    /// The extracted URL, if the submission has a usable image
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageSource::Preview(url)
            | ImageSource::DirectLink(url)
            | ImageSource::Gallery(url) => Some(url),
            ImageSource::NoImage => None,
        }
    }
}

/// A post with a usable image, ready for the relay loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePost {
    /// Platform-specific post ID (the dedup key)
    pub id: String,
    /// Post title (log context only, never sent with the photo)
    pub title: String,
    /// Extracted image URL
    pub image_url: String,
}

/// Outcome of one delivery attempt within a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// Image downloaded and sent to the destination chat
    Delivered,
    /// Image download failed; post skipped
    DownloadFailed,
    /// Download succeeded but the photo upload failed
    SendFailed,
    /// Not attempted (dry run)
    Skipped,
}

/// Summary of one poll cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Per-post outcomes, in delivery (oldest-first) order
    pub outcomes: Vec<(String, DeliveryResult)>,
}

impl CycleReport {
    /// Number of new posts processed this cycle
    pub fn new_posts(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of posts actually delivered
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, r)| *r == DeliveryResult::Delivered)
            .count()
    }
}
