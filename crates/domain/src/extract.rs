//! Image-URL extraction over submission shapes
//!
//! A submission can carry its image in one of three places: a preview
//! payload, a direct link to an image file, or a gallery. Classification
//! tries them in that order; the first match wins.

use crate::model::{ImageSource, Submission};

/// File extensions accepted as direct image links
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Classify a submission into its image source
pub fn classify_image(submission: &Submission) -> ImageSource {
    if let Some(url) = &submission.preview_url {
        return ImageSource::Preview(url.clone());
    }

    if !submission.is_self && is_image_url(&submission.url) {
        return ImageSource::DirectLink(submission.url.clone());
    }

    // Gallery entries keep their stored order; take the first actual image
    if let Some(entry) = submission.gallery.iter().find(|e| e.kind == "Image") {
        return ImageSource::Gallery(entry.url.clone());
    }

    ImageSource::NoImage
}

/// Whether a URL ends in a known image extension (case-insensitive)
pub fn is_image_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
