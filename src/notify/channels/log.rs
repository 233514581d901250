use async_trait::async_trait;
use tracing::{info, warn};

use super::{ChannelError, NotifyChannel};
use crate::notify::{Message, Severity};

/// Writes every message as a structured tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

#[async_trait]
impl NotifyChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, message: &Message) -> Result<(), ChannelError> {
        match message.severity {
            Severity::Critical | Severity::Warning => warn!(
                subject = %message.subject_id,
                severity = %message.severity,
                title = %message.title,
                "{}",
                message.body
            ),
            Severity::Info => info!(
                subject = %message.subject_id,
                title = %message.title,
                "{}",
                message.body
            ),
        }
        Ok(())
    }
}
