//! Interaction log trait — the append-only record of every exchange.
//!
//! Each accepted user message and the reply it produced become one
//! [`LogRecord`]. Records are never updated or deleted; the only operations
//! are `append` and `read_all`.

use crate::error::LogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Positive, increasing with every append. Assigned by the backend.
    pub id: i64,

    /// What the user typed
    pub user_text: String,

    /// What the assistant answered
    pub assistant_text: String,

    /// When the record was appended
    pub created_at: DateTime<Utc>,
}

/// The core InteractionLog trait.
///
/// Implementations: SQLite, JSONL file, in-memory (for testing).
///
/// Backends may be shared between sessions through an `Arc`, so `append`
/// must serialize writers: two concurrent appends never interleave and
/// each gets its own id.
#[async_trait]
pub trait InteractionLog: Send + Sync {
    /// The backend name (e.g., "sqlite", "file", "in_memory").
    fn name(&self) -> &str;

    /// Append one exchange and return its id.
    async fn append(
        &self,
        user_text: &str,
        assistant_text: &str,
    ) -> std::result::Result<i64, LogError>;

    /// Every record, oldest first.
    async fn read_all(&self) -> std::result::Result<Vec<LogRecord>, LogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_record_serialization() {
        let record = LogRecord {
            id: 1,
            user_text: "Hello".into(),
            assistant_text: "Hi there".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"user_text\":\"Hello\""));
        let back: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
