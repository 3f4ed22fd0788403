//! File-based log backend — append-only JSON-lines storage.
//!
//! Each line is one JSON-encoded `LogRecord`. The file is opened in append
//! mode for every write and never rewritten, so earlier records stay intact
//! even if the process dies mid-append.
//!
//! Human-inspectable, portable, and needs no database.

use async_trait::async_trait;
use chrono::Utc;
use parley_core::error::LogError;
use parley_core::log::{InteractionLog, LogRecord};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A JSONL-backed interaction log.
pub struct FileLog {
    path: PathBuf,
    /// Next id to hand out. The lock is also the single-writer gate.
    next_id: Mutex<i64>,
}

impl FileLog {
    /// Open the log at `path`, recovering the next id from existing records.
    ///
    /// A missing file is fine; it is created on the first append. A last line
    /// left without its newline by a crash is terminated here, so the next
    /// append starts on a line of its own.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let content = Self::read_content(&path).await?;
        if !content.is_empty() && !content.ends_with('\n') {
            warn!(path = %path.display(), "Log ends in a partial record, terminating it");
            Self::append_raw(&path, "\n").await?;
        }

        let records = parse_records(&content);
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        debug!(path = %path.display(), count = records.len(), "File log opened");
        Ok(Self {
            path,
            next_id: Mutex::new(next_id),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_content(path: &Path) -> Result<String, LogError> {
        match tokio::fs::read_to_string(path).await {
            Ok(c) => Ok(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(LogError::Storage(format!("Failed to read log file: {e}"))),
        }
    }

    /// Append `text` to the file, creating it and its parent directories.
    async fn append_raw(path: &Path, text: &str) -> Result<(), LogError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LogError::Storage(format!("Failed to create log directory: {e}")))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to open log file: {e}")))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| LogError::Storage(format!("Failed to write log file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| LogError::Storage(format!("Failed to flush log file: {e}")))
    }
}

/// Parse every readable line, skipping corrupted ones.
fn parse_records(content: &str) -> Vec<LogRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping corrupted log line");
                None
            }
        })
        .collect()
}

#[async_trait]
impl InteractionLog for FileLog {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, user_text: &str, assistant_text: &str) -> Result<i64, LogError> {
        let mut next_id = self.next_id.lock().await;

        let record = LogRecord {
            id: *next_id,
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            created_at: Utc::now(),
        };
        let mut line = serde_json::to_string(&record)
            .map_err(|e| LogError::Storage(format!("Failed to serialize log record: {e}")))?;
        line.push('\n');

        Self::append_raw(&self.path, &line).await?;

        *next_id += 1;
        debug!(id = record.id, "Appended log record");
        Ok(record.id)
    }

    async fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        // Wait out any in-flight append so we never read half a line
        let _guard = self.next_id.lock().await;
        let mut records = parse_records(&Self::read_content(&self.path).await?);
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}
