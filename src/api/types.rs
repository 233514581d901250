//! Request and response bodies of the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actors::TickStats;
use crate::notify::Message;
use crate::notify::channels::ChannelError;
use crate::storage::HealthStatus;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

/// `?limit=n` query for list endpoints
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

/// `?limit=n&since=<rfc3339>` query for the event log
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
    pub since: Option<DateTime<Utc>>,
}

impl LogQuery {
    pub fn limit(&self) -> usize {
        LimitQuery { limit: self.limit }.limit()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub event_log: EventLogHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventLogHealth {
    pub backend: String,
    pub healthy: bool,
    pub message: String,
}

impl EventLogHealth {
    pub fn new(backend: &str, health: HealthStatus) -> Self {
        Self {
            backend: backend.to_string(),
            healthy: health.healthy,
            message: health.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub timestamp: String,
    pub event_log_entries: usize,
    pub actors: Vec<TickStats>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewReminder {
    pub text: String,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManualAlertRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct DeliveryReport {
    pub channel: &'static str,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn new(channel: &'static str, result: Result<(), ChannelError>) -> Self {
        Self {
            channel,
            delivered: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ManualAlertResponse {
    pub message: Message,
    pub deliveries: Vec<DeliveryReport>,
}
