use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, instrument};

use super::{ChannelError, NotifyChannel};
use crate::config::Webhook;
use crate::notify::Message;

/// Posts messages as JSON to a generic webhook
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    webhook: Webhook,
}

impl WebhookChannel {
    pub fn new(webhook: Webhook) -> Self {
        Self {
            client: Client::new(),
            webhook,
        }
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self) -> bool {
        !self.webhook.url.is_empty()
    }

    #[instrument(skip(self, message), fields(subject = %message.subject_id))]
    async fn deliver(&self, message: &Message) -> Result<(), ChannelError> {
        let payload = json!({
            "title": message.title,
            "message": message.body,
            "subject": message.subject_id,
            "severity": message.severity,
            "origin": message.origin,
            "timestamp": message.created_at.to_rfc3339(),
        });

        let response = self
            .client
            .post(&self.webhook.url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChannelError::Status(response.status().as_u16()));
        }

        info!("successfully sent webhook notification");
        Ok(())
    }
}
