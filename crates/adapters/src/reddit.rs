//! Reddit API post source

use async_trait::async_trait;
use image_relay_domain::{
    GalleryEntry, ImagePost, PostSource, PostSourceError, Submission, classify_image,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Reddit post source reading a user's newest submissions
///
/// Authenticates with the client-credentials OAuth2 flow and caches the
/// bearer token until shortly before it expires.
pub struct RedditPostSource {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    user_agent: String,
    auth_base_url: String,
    api_base_url: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl RedditPostSource {
    pub fn new(client_id: String, client_secret: SecretString, user_agent: String) -> Self {
        Self::with_base_urls(
            client_id,
            client_secret,
            user_agent,
            "https://www.reddit.com".to_string(),
            "https://oauth.reddit.com".to_string(),
        )
    }

    pub fn with_base_urls(
        client_id: String,
        client_secret: SecretString,
        user_agent: String,
        auth_base_url: String,
        api_base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            client_id,
            client_secret,
            user_agent,
            auth_base_url,
            api_base_url,
            token: Mutex::new(None),
        }
    }

    /// Get a valid access token, refreshing it when missing or near expiry
    async fn access_token(&self) -> Result<String, PostSourceError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/api/v1/access_token", self.auth_base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PostSourceError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(PostSourceError::Auth(
                "Invalid client id/secret".to_string(),
            ));
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostSourceError::Api(format!(
                "Failed to get access token: {}",
                body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| PostSourceError::Api(e.to_string()))?;

        let access_token = token_response.access_token;
        // Refresh one minute early rather than risk using a stale token
        let lifetime = Duration::from_secs(token_response.expires_in.saturating_sub(60));

        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(access_token)
    }

    async fn fetch_listing(
        &self,
        author: &str,
        limit: usize,
    ) -> Result<Vec<RawSubmission>, PostSourceError> {
        let token = self.access_token().await?;

        let url = format!(
            "{}/user/{}/submitted?sort=new&limit={}",
            self.api_base_url, author, limit
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| PostSourceError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(PostSourceError::Auth("Access token rejected".to_string()));
        }

        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map(Duration::from_secs_f64);
            return Err(PostSourceError::RateLimited(retry_after));
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostSourceError::Api(format!(
                "Failed to get submissions: {}",
                body
            )));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| PostSourceError::Api(e.to_string()))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .collect())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    3600
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: RawSubmission,
}

#[derive(Deserialize)]
struct RawSubmission {
    id: String,
    title: String,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    url: String,
    preview: Option<Preview>,
    media_metadata: Option<HashMap<String, MediaMeta>>,
    gallery_data: Option<GalleryData>,
}

#[derive(Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Deserialize)]
struct PreviewImage {
    source: PreviewSource,
}

#[derive(Deserialize)]
struct PreviewSource {
    url: String,
}

#[derive(Deserialize)]
struct MediaMeta {
    e: Option<String>,
    s: Option<MediaSource>,
}

#[derive(Deserialize)]
struct MediaSource {
    u: Option<String>,
}

#[derive(Deserialize)]
struct GalleryData {
    #[serde(default)]
    items: Vec<GalleryItem>,
}

#[derive(Deserialize)]
struct GalleryItem {
    media_id: String,
}

/// Reddit HTML-escapes URLs in its JSON payloads
fn unescape_url(url: &str) -> String {
    url.replace("&amp;", "&")
}

impl RawSubmission {
    /// Map the wire shape into the normalized domain submission
    fn normalize(self) -> Submission {
        let preview_url = self
            .preview
            .as_ref()
            .and_then(|p| p.images.first())
            .map(|image| unescape_url(&image.source.url));

        let gallery = match (&self.gallery_data, &self.media_metadata) {
            // gallery_data.items carries the stored entry order
            (Some(gallery_data), Some(metadata)) => gallery_data
                .items
                .iter()
                .filter_map(|item| {
                    let meta = metadata.get(&item.media_id)?;
                    Some(GalleryEntry {
                        kind: meta.e.clone().unwrap_or_default(),
                        url: meta
                            .s
                            .as_ref()
                            .and_then(|s| s.u.as_deref())
                            .map(unescape_url)
                            .unwrap_or_default(),
                    })
                })
                .collect(),
            // Some gallery posts lack gallery_data; fall back to the metadata map
            (None, Some(metadata)) => metadata
                .values()
                .map(|meta| GalleryEntry {
                    kind: meta.e.clone().unwrap_or_default(),
                    url: meta
                        .s
                        .as_ref()
                        .and_then(|s| s.u.as_deref())
                        .map(unescape_url)
                        .unwrap_or_default(),
                })
                .collect(),
            _ => vec![],
        };

        Submission {
            id: self.id,
            title: self.title,
            is_self: self.is_self,
            url: self.url,
            preview_url,
            gallery,
        }
    }
}

#[async_trait]
impl PostSource for RedditPostSource {
    async fn fetch_recent(
        &self,
        author: &str,
        limit: usize,
    ) -> Result<Vec<ImagePost>, PostSourceError> {
        tracing::debug!(author = %author, limit = limit, "Fetching submissions from Reddit");

        let submissions = self.fetch_listing(author, limit).await?;

        // Keep only submissions with a usable image, newest first
        let posts: Vec<ImagePost> = submissions
            .into_iter()
            .map(RawSubmission::normalize)
            .filter_map(|submission| {
                let image_url = classify_image(&submission).url()?.to_string();
                Some(ImagePost {
                    id: submission.id,
                    title: submission.title,
                    image_url,
                })
            })
            .collect();

        tracing::info!(author = %author, count = posts.len(), "Fetched image posts");

        Ok(posts)
    }
}
