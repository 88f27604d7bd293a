use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::app::{Result, StripError};
use crate::config::TelegramConfig;
use crate::delivery::{outbound, Outbound, Sink};
use crate::domain::Update;

/// Pushes updates to a single chat through the Telegram Bot API.
pub struct TelegramSink {
    client: Client,
    base_url: String,
    chat_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramSink {
    pub fn new(client: Client, config: &TelegramConfig) -> Result<Self> {
        let (token, chat_id) = config.credentials()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), token),
            chat_id: chat_id.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn send_photo(&self, image: &[u8], caption: &str) -> Result<()> {
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(image.to_vec()).file_name("strip"));

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await
    }

    /// `sendMessage` body; `parse_mode` is only set for MarkdownV2 text.
    fn message_payload(&self, text: &str, markdown: bool) -> serde_json::Value {
        let mut payload = json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        if markdown {
            payload["parse_mode"] = json!("MarkdownV2");
        }
        payload
    }

    async fn send_message(&self, text: &str, markdown: bool) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&self.message_payload(text, markdown))
            .send()
            .await?;
        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let body: ApiResponse = response.json().await.map_err(|e| {
            StripError::Delivery(format!("unreadable Bot API response ({}): {}", status, e))
        })?;

        if body.ok {
            Ok(())
        } else {
            Err(StripError::Delivery(
                body.description
                    .unwrap_or_else(|| format!("Bot API returned {}", status)),
            ))
        }
    }
}

#[async_trait]
impl Sink for TelegramSink {
    async fn deliver(&self, updates: &[Update]) -> Result<()> {
        let messages = outbound(updates);
        info!(updates = updates.len(), messages = messages.len(), "Sending to Telegram");

        for message in messages {
            match message {
                Outbound::Photo { image, caption } => {
                    debug!(caption = %caption, "sendPhoto");
                    self.send_photo(image, &caption).await?;
                }
                Outbound::Text(text) => {
                    debug!("sendMessage");
                    self.send_message(text, false).await?;
                }
                Outbound::Markdown(text) => {
                    debug!("sendMessage (MarkdownV2)");
                    self.send_message(text, true).await?;
                }
            }
        }

        Ok(())
    }
}
