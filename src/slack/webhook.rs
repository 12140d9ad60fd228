//! Incoming-webhook client for chat notifications.

use serde_json::{json, Value};

use crate::{AppError, Result};

/// Posts block payloads to a chat incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Notifier posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Post the blocks as a `{"blocks": [...]}` JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Notify`] on transport failure or a non-2xx
    /// response. Call sites treat delivery as best-effort.
    pub async fn send(&self, blocks: &[Value]) -> Result<()> {
        self.http
            .post(&self.url)
            .json(&json!({ "blocks": blocks }))
            .send()
            .await
            .map_err(|err| AppError::Notify(format!("webhook post failed: {err}")))?
            .error_for_status()
            .map_err(|err| AppError::Notify(format!("webhook rejected notice: {err}")))?;
        Ok(())
    }
}
