//! HTTP image downloader

use async_trait::async_trait;
use image_relay_domain::{FetchError, ImageFetcher};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Default bound on one image download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Image fetcher backed by a plain HTTP GET
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if let Err(e) = tokio::fs::write(dest, &bytes).await {
            // Don't leave a partial file behind
            let _ = tokio::fs::remove_file(dest).await;
            return Err(FetchError::Io(e));
        }

        Ok(())
    }
}
