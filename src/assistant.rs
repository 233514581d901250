//! Conversational replies for the resident

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::notify::Notifier;
use crate::notify::templates::{CHAT_FALLBACK, chat_prompt};

/// Answers free-form questions through the configured text generator
#[derive(Clone)]
pub struct Assistant {
    notifier: Arc<Notifier>,
}

impl Assistant {
    pub fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }

    /// Reply to `input`, or apologise if no reply could be generated
    #[instrument(skip(self, input), fields(len = input.len()))]
    pub async fn reply(&self, input: &str) -> String {
        let input = input.trim();
        if input.is_empty() {
            return CHAT_FALLBACK.to_string();
        }

        match self.notifier.generate(&chat_prompt(input)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("chat generation failed: {e}");
                CHAT_FALLBACK.to_string()
            }
        }
    }
}
