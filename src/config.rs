use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::trace;

/// Event log backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory log (no persistence)
    #[serde(rename = "none")]
    None,

    /// Append-only JSON-lines file (default)
    Jsonl {
        #[serde(default = "default_log_path")]
        path: PathBuf,
    },

    /// SQLite database
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Jsonl {
            path: default_log_path(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("./data/health_log.jsonl")
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./data/event_log.db")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderStoreConfig {
    /// Path to the reminders SQLite database; `None` keeps reminders in memory
    #[serde(default = "default_reminder_path")]
    pub path: Option<PathBuf>,
}

impl Default for ReminderStoreConfig {
    fn default() -> Self {
        Self {
            path: default_reminder_path(),
        }
    }
}

fn default_reminder_path() -> Option<PathBuf> {
    Some(PathBuf::from("./data/reminders.db"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub subject: SubjectConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub reminders: ReminderConfig,

    #[serde(default)]
    pub thresholds: Thresholds,

    /// Minimum seconds between two alerts with the same subject and signature
    #[serde(default = "default_cool_down")]
    pub cool_down_secs: u64,

    /// How often an event log append is retried before the tick is failed
    #[serde(default = "default_append_retries")]
    pub append_retries: u32,

    /// Per-channel delivery timeout in seconds
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,

    /// Event log configuration (optional - defaults to a JSON-lines file)
    pub storage: Option<StorageConfig>,

    #[serde(default)]
    pub reminder_store: ReminderStoreConfig,

    /// Text-generation backend; without it only template messages are produced
    pub generator: Option<GeneratorConfig>,

    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,

    pub api: Option<ApiSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subject: SubjectConfig::default(),
            health: HealthConfig::default(),
            safety: SafetyConfig::default(),
            reminders: ReminderConfig::default(),
            thresholds: Thresholds::default(),
            cool_down_secs: default_cool_down(),
            append_retries: default_append_retries(),
            delivery_timeout_secs: default_delivery_timeout(),
            storage: None,
            reminder_store: ReminderStoreConfig::default(),
            generator: None,
            channels: default_channels(),
            api: None,
        }
    }
}

impl Config {
    pub fn cool_down(&self) -> Duration {
        Duration::from_secs(self.cool_down_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectConfig {
    #[serde(default = "default_subject_id")]
    pub id: String,
    pub display: Option<String>,
}

impl SubjectConfig {
    pub fn display_name(&self) -> String {
        self.display.clone().unwrap_or_else(|| self.id.clone())
    }
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            id: default_subject_id(),
            display: None,
        }
    }
}

fn default_subject_id() -> String {
    String::from("resident-1")
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_interval")]
    pub interval: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: default_health_interval(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_safety_interval")]
    pub interval: u64,
    /// Probability that a simulated tick observes movement
    #[serde(default = "default_movement_probability")]
    pub movement_probability: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            interval: default_safety_interval(),
            movement_probability: default_movement_probability(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_reminder_interval")]
    pub interval: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval: default_reminder_interval(),
            enabled: true,
        }
    }
}

/// Classification thresholds. Bounds are exclusive: a reading equal to a
/// bound is normal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_heart_rate_min")]
    pub heart_rate_min: f64,
    #[serde(default = "default_heart_rate_max")]
    pub heart_rate_max: f64,
    #[serde(default = "default_bp_sys_max")]
    pub bp_sys_max: f64,
    #[serde(default = "default_bp_dia_max")]
    pub bp_dia_max: f64,
    #[serde(default = "default_glucose_max")]
    pub glucose_max: f64,
    #[serde(default = "default_inactivity_secs")]
    pub inactivity_secs: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heart_rate_min: default_heart_rate_min(),
            heart_rate_max: default_heart_rate_max(),
            bp_sys_max: default_bp_sys_max(),
            bp_dia_max: default_bp_dia_max(),
            glucose_max: default_glucose_max(),
            inactivity_secs: default_inactivity_secs(),
        }
    }
}

fn default_heart_rate_min() -> f64 {
    60.0
}

fn default_heart_rate_max() -> f64 {
    100.0
}

fn default_bp_sys_max() -> f64 {
    140.0
}

fn default_bp_dia_max() -> f64 {
    90.0
}

fn default_glucose_max() -> f64 {
    140.0
}

fn default_inactivity_secs() -> f64 {
    120.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: default_generator_url(),
            model: default_model(),
            timeout_secs: default_generator_timeout(),
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_generator_url() -> String {
    String::from("http://localhost:11434")
}

fn default_model() -> String {
    String::from("llama3.2:latest")
}

fn default_generator_timeout() -> u64 {
    20
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Structured log line via tracing
    Log,
    Email(Email),
    Webhook(Webhook),
    /// In-process ring of recent messages for the dashboard
    Banner {
        #[serde(default = "default_banner_capacity")]
        capacity: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Email {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from: String,
    pub to: String,
}

fn default_smtp_host() -> String {
    String::from("smtp.gmail.com")
}

fn default_smtp_port() -> u16 {
    587
}

fn default_banner_capacity() -> usize {
    50
}

fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::Log,
        ChannelConfig::Banner {
            capacity: default_banner_capacity(),
        },
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    pub token: Option<String>,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_true() -> bool {
    true
}

fn default_health_interval() -> u64 {
    60
}

fn default_safety_interval() -> u64 {
    10
}

fn default_movement_probability() -> f64 {
    0.8
}

fn default_reminder_interval() -> u64 {
    60
}

fn default_cool_down() -> u64 {
    120
}

fn default_append_retries() -> u32 {
    3
}

fn default_delivery_timeout() -> u64 {
    15
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
}
