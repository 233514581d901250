use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{ChannelError, NotifyChannel};
use crate::notify::Message;

/// Ring of the most recent messages, read by the dashboard API
#[derive(Debug, Clone)]
pub struct BannerBoard {
    capacity: usize,
    messages: Arc<Mutex<VecDeque<Message>>>,
}

impl BannerBoard {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn push(&self, message: Message) {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.push_back(message);
        while messages.len() > self.capacity {
            messages.pop_front();
        }
    }

    /// Up to `n` most recent messages, oldest first
    pub fn recent(&self, n: usize) -> Vec<Message> {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = messages.len().saturating_sub(n);
        messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct BannerChannel {
    board: BannerBoard,
}

impl BannerChannel {
    pub fn new(board: BannerBoard) -> Self {
        Self { board }
    }
}

#[async_trait]
impl NotifyChannel for BannerChannel {
    fn name(&self) -> &'static str {
        "banner"
    }

    async fn deliver(&self, message: &Message) -> Result<(), ChannelError> {
        self.board.push(message.clone());
        Ok(())
    }
}
