//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use parley_core::error::LogError;
use parley_core::log::{InteractionLog, LogRecord};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory log that keeps records in a Vec.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryLog {
    records: Arc<RwLock<Vec<LogRecord>>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractionLog for InMemoryLog {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, user_text: &str, assistant_text: &str) -> Result<i64, LogError> {
        // Holding the write guard makes id assignment and push one step
        let mut records = self.records.write().await;
        let id = records.last().map_or(1, |r| r.id + 1);
        records.push(LogRecord {
            id,
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        Ok(self.records.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_read_back() {
        let log = InMemoryLog::new();
        assert!(log.is_empty().await);

        let id = log.append("Hello", "Hi there").await.unwrap();
        assert_eq!(id, 1);

        let records = log.read_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_text, "Hello");
        assert_eq!(records[0].assistant_text, "Hi there");
    }

    #[tokio::test]
    async fn ids_increase_and_order_is_kept() {
        let log = InMemoryLog::new();
        for i in 0..5 {
            let id = log.append(&format!("q{i}"), &format!("a{i}")).await.unwrap();
            assert_eq!(id, i + 1);
        }

        let records = log.read_all().await.unwrap();
        let users: Vec<&str> = records.iter().map(|r| r.user_text.as_str()).collect();
        assert_eq!(users, vec!["q0", "q1", "q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn concurrent_appends_get_unique_ids() {
        let log = Arc::new(InMemoryLog::new());
        let mut handles = Vec::new();
        for i in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(&format!("q{i}"), &format!("a{i}")).await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
        assert_eq!(log.len().await, 20);
    }
}
