use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use tracing::{info, warn};

use super::format::Embed;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("webhook status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Client for a fixed Discord webhook endpoint.
pub struct WebhookClient {
    http: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Post a single embed to the webhook.
    pub async fn deliver(&self, embed: &Embed) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&json!({ "embeds": [embed] }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unable to read body".to_string());
            warn!("Webhook returned error status {}: {}", status, body);
            return Err(DeliveryError::Status { status, body });
        }

        info!("Delivered embed '{}'", embed.title);
        Ok(())
    }
}
