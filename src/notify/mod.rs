//! Message rendering and delivery
//!
//! The [`Notifier`] turns issues and reminders into a [`Message`] and hands it
//! to every enabled channel.
//!
//! ## Rendering
//!
//! If a [`TextGenerator`] is configured the message body is generated from a
//! prompt, bounded by the generation timeout. Any generation failure or
//! timeout falls back to the deterministic template, so a message is always
//! produced.
//!
//! ## Delivery
//!
//! Channels are delivered concurrently, each bounded by the delivery
//! timeout. A channel failure is logged and never reaches the caller or
//! the other channels.

pub mod channels;
pub mod generator;
pub mod templates;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{ChannelConfig, Config};
use crate::storage::reminders::ReminderTask;
use crate::{IssueSet, Sample};

use channels::{
    BannerBoard, BannerChannel, ChannelError, EmailChannel, LogChannel, NotifyChannel,
    WebhookChannel,
};
use generator::{GenerationError, OllamaGenerator, TextGenerator};

const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Whether a message body came from the text generator or a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    Generated,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub subject_id: String,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub origin: MessageOrigin,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        subject_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        severity: Severity,
        origin: MessageOrigin,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            title: title.into(),
            body: body.into(),
            severity,
            origin,
            created_at: Utc::now(),
        }
    }
}

pub struct Notifier {
    generator: Option<Arc<dyn TextGenerator>>,
    generation_timeout: Duration,
    channels: Vec<Arc<dyn NotifyChannel>>,
    delivery_timeout: Duration,
}

impl Notifier {
    /// Template-only notifier without channels
    pub fn new() -> Self {
        Self {
            generator: None,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            channels: vec![],
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        self.generator = Some(generator);
        self.generation_timeout = timeout;
        self
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotifyChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Build the notifier described by the configuration.
    ///
    /// Returns the banner board as well if a banner channel is configured.
    pub fn from_config(config: &Config) -> anyhow::Result<(Self, Option<BannerBoard>)> {
        let mut notifier = Notifier::new().with_delivery_timeout(config.delivery_timeout());
        let mut board = None;

        if let Some(generator_config) = &config.generator {
            let generator = OllamaGenerator::new(generator_config)?;
            info!(
                "text generation enabled ({} at {})",
                generator.model(),
                generator_config.url
            );
            notifier = notifier.with_generator(Arc::new(generator), generator_config.timeout());
        }

        for channel in &config.channels {
            let channel: Arc<dyn NotifyChannel> = match channel {
                ChannelConfig::Log => Arc::new(LogChannel),
                ChannelConfig::Email(email) => Arc::new(EmailChannel::from_env(email.clone())),
                ChannelConfig::Webhook(webhook) => Arc::new(WebhookChannel::new(webhook.clone())),
                ChannelConfig::Banner { capacity } => {
                    let banner = board.get_or_insert_with(|| BannerBoard::new(*capacity));
                    Arc::new(BannerChannel::new(banner.clone()))
                }
            };

            if channel.enabled() {
                debug!("notification channel {} enabled", channel.name());
            } else {
                warn!("notification channel {} is not configured", channel.name());
            }
            notifier.channels.push(channel);
        }

        Ok((notifier, board))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.iter().filter(|c| c.enabled()).count()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Ask the generator, bounded by the generation timeout
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(generator) = &self.generator else {
            return Err(GenerationError::NotConfigured);
        };

        match tokio::time::timeout(self.generation_timeout, generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.generation_timeout)),
        }
    }

    async fn render(&self, prompt: impl FnOnce() -> String, fallback: String) -> (String, MessageOrigin) {
        if self.generator.is_none() {
            return (fallback, MessageOrigin::Template);
        }

        match self.generate(&prompt()).await {
            Ok(text) => (text, MessageOrigin::Generated),
            Err(e) => {
                warn!("text generation failed, using template: {e}");
                (fallback, MessageOrigin::Template)
            }
        }
    }

    /// Render the alert message for a set of issues
    pub async fn render_alert(&self, subject: &str, issues: &IssueSet, sample: &Sample) -> Message {
        let (body, origin) = self
            .render(
                || templates::alert_prompt(subject, issues, sample),
                templates::alert_message(subject, issues, sample),
            )
            .await;

        Message::new(
            sample.subject_id.clone(),
            templates::alert_title(subject, sample),
            body,
            Severity::Critical,
            origin,
        )
    }

    /// Render an alert a caregiver raised by hand
    pub async fn render_manual_alert(&self, subject_id: &str, subject: &str, reason: &str) -> Message {
        let (body, origin) = self
            .render(
                || templates::manual_alert_prompt(subject, reason),
                templates::manual_alert_message(subject, reason),
            )
            .await;

        Message::new(
            subject_id,
            templates::manual_alert_title(subject),
            body,
            Severity::Critical,
            origin,
        )
    }

    /// Render the message for a due reminder
    pub async fn render_reminder(&self, subject_id: &str, task: &ReminderTask) -> Message {
        let (body, origin) = self
            .render(
                || templates::reminder_prompt(task),
                templates::reminder_message(task),
            )
            .await;

        Message::new(
            subject_id,
            templates::reminder_title(task),
            body,
            Severity::Info,
            origin,
        )
    }

    /// Deliver to every enabled channel; returns the per-channel outcome
    pub async fn deliver(&self, message: &Message) -> Vec<(&'static str, Result<(), ChannelError>)> {
        let deliveries = self
            .channels
            .iter()
            .filter(|channel| channel.enabled())
            .map(|channel| async move {
                let result =
                    match tokio::time::timeout(self.delivery_timeout, channel.deliver(message)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ChannelError::Timeout),
                    };

                match &result {
                    Ok(()) => debug!(channel = channel.name(), "notification delivered"),
                    Err(e) => error!(channel = channel.name(), error = %e, "failed to deliver notification"),
                }

                (channel.name(), result)
            });

        join_all(deliveries).await
    }

    /// Render and deliver an alert
    pub async fn notify(&self, subject: &str, issues: &IssueSet, sample: &Sample) -> Message {
        let message = self.render_alert(subject, issues, sample).await;
        self.deliver(&message).await;
        message
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
