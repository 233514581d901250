//! Notification channel implementations.

pub mod banner;
pub mod email;
pub mod log;
pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

use super::Message;

pub use banner::{BannerBoard, BannerChannel};
pub use email::EmailChannel;
pub use log::LogChannel;
pub use webhook::WebhookChannel;

/// Errors that can occur when delivering a message.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The receiving endpoint rejected the message
    #[error("endpoint responded with status {0}")]
    Status(u16),

    /// Channel is not configured
    #[error("channel not configured: {0}")]
    NotConfigured(String),

    /// Email could not be built or sent
    #[error("email delivery failed: {0}")]
    Email(String),

    /// Delivery exceeded its time budget
    #[error("delivery timed out")]
    Timeout,
}

/// Trait for notification channels (log, email, webhook, banner).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool {
        true
    }

    /// Deliver a message through this channel.
    async fn deliver(&self, message: &Message) -> Result<(), ChannelError>;
}
