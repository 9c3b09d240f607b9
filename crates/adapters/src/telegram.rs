//! Telegram Bot API photo sink

use async_trait::async_trait;
use image_relay_domain::{DeliveryError, PhotoSink};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Telegram photo sink posting to a fixed chat
pub struct TelegramPhotoSink {
    client: Client,
    bot_token: SecretString,
    chat_id: String,
    base_url: String,
    enabled: bool,
}

impl TelegramPhotoSink {
    pub fn new(bot_token: SecretString, chat_id: String) -> Self {
        Self::with_base_url(bot_token, chat_id, "https://api.telegram.org".to_string())
    }

    pub fn with_base_url(bot_token: SecretString, chat_id: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            bot_token,
            chat_id,
            base_url,
            enabled: true,
        }
    }

    /// Create a disabled sink (for dry-run and doctor checks)
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            bot_token: SecretString::new("".into()),
            chat_id: String::new(),
            base_url: String::new(),
            enabled: false,
        }
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

#[async_trait]
impl PhotoSink for TelegramPhotoSink {
    async fn send_photo(&self, path: &Path) -> Result<(), DeliveryError> {
        if !self.enabled {
            return Err(DeliveryError::Api("Sink is disabled".to_string()));
        }

        let bytes = tokio::fs::read(path).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());

        // No caption: the photo is the whole message
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("photo", Part::bytes(bytes).file_name(file_name));

        let url = format!(
            "{}/bot{}/sendPhoto",
            self.base_url,
            self.bot_token.expose_secret()
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        if response.status() == 401 {
            return Err(DeliveryError::Auth("Invalid bot token".to_string()));
        }

        if response.status() == 429 {
            return Err(DeliveryError::RateLimited);
        }

        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        if !status.is_success() || !body.ok {
            return Err(DeliveryError::Api(
                body.description
                    .unwrap_or_else(|| format!("sendPhoto failed with status {}", status)),
            ));
        }

        Ok(())
    }
}
