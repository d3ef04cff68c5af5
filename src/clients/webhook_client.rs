use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::models::webhook::WebhookPayload;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("request to webhook failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook rejected the payload with {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), SendError>;
}

/// Posts embeds to a Discord webhook. Only `204 No Content` counts as
/// delivered.
pub struct WebhookSender {
    http: reqwest::Client,
}

impl WebhookSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NotificationSink for WebhookSender {
    async fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), SendError> {
        let response = self.http.post(webhook_url).json(payload).send().await?;
        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("webhook accepted the payload");
        Ok(())
    }
}
