//! Append-only JSON-lines event log
//!
//! One JSON record per line. Appends and reads share a lock on the file
//! handle, so a reader never sees a half-written line from this process.
//!
//! An append either lands as one complete line or not at all: a failed write
//! truncates the file back to its length before the write. If that truncation
//! fails too, or the file was left torn by an earlier crash, the next append
//! starts on a fresh line. Lines that fail to parse are skipped with a warning.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::error::StorageResult;
use super::event_log::{EventLog, HealthStatus, LogEntry, keep_last, order_by_timestamp};

/// Append handle plus the length of the file's complete content
struct LineWriter {
    file: File,
    len: u64,
    /// The file does not end with a newline
    torn: bool,
}

impl LineWriter {
    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let mut bytes = Vec::with_capacity(line.len() + 2);
        if self.torn {
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        self.file.write_all(&bytes).await?;
        self.file.flush().await?;

        self.len += bytes.len() as u64;
        self.torn = false;
        Ok(())
    }

    /// Drop whatever a failed write left behind
    async fn rollback(&mut self) {
        match self.file.set_len(self.len).await {
            Ok(()) => debug!("truncated partial write back to {} bytes", self.len),
            Err(e) => {
                warn!("failed to truncate partial write: {e}");
                self.torn = true;
            }
        }
    }
}

/// Whether a non-empty file is missing its trailing newline
async fn ends_torn(path: &Path, len: u64) -> std::io::Result<bool> {
    if len == 0 {
        return Ok(false);
    }

    let mut file = File::open(path).await?;
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

pub struct JsonLinesEventLog {
    path: PathBuf,
    writer: Mutex<LineWriter>,
}

impl JsonLinesEventLog {
    /// Open (or create) the log file, creating parent directories as needed
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let len = file.metadata().await?.len();
        let torn = ends_torn(&path, len).await?;
        if torn {
            warn!("{} ends with an incomplete line", path.display());
        }

        info!("event log opened at {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(LineWriter { file, len, torn }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> StorageResult<Vec<LogEntry>> {
        let content = fs::read_to_string(&self.path).await?;

        let mut entries: Vec<LogEntry> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(number, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("skipping corrupt line {} in {}: {e}", number + 1, self.path.display());
                    None
                }
            })
            .collect();

        order_by_timestamp(&mut entries);
        Ok(entries)
    }
}

#[async_trait]
impl EventLog for JsonLinesEventLog {
    async fn append(&self, entry: LogEntry) -> StorageResult<()> {
        let line = serde_json::to_string(&entry)?;

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_line(&line).await {
            writer.rollback().await;
            return Err(e.into());
        }

        debug!("appended entry for {}", entry.subject_id());
        Ok(())
    }

    async fn tail(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let _guard = self.writer.lock().await;
        Ok(keep_last(self.read_all().await?, n))
    }

    async fn alerts(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let _guard = self.writer.lock().await;
        let alerts = self
            .read_all()
            .await?
            .into_iter()
            .filter(|entry| entry.alert.is_some())
            .collect();
        Ok(keep_last(alerts, n))
    }

    async fn since(&self, since: DateTime<Utc>) -> StorageResult<Vec<LogEntry>> {
        let _guard = self.writer.lock().await;
        let mut entries = self.read_all().await?;
        entries.retain(|entry| entry.timestamp() >= since);
        Ok(entries)
    }

    async fn len(&self) -> StorageResult<usize> {
        let _guard = self.writer.lock().await;
        Ok(self.read_all().await?.len())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let mut metadata = HashMap::from([
            ("backend".to_string(), "jsonl".to_string()),
            ("path".to_string(), self.path.display().to_string()),
        ]);

        match fs::metadata(&self.path).await {
            Ok(meta) => {
                metadata.insert("bytes".to_string(), meta.len().to_string());
                Ok(HealthStatus {
                    healthy: true,
                    message: "JSON-lines event log operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {e}");
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("log file not accessible: {e}"),
                    metadata,
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
