//! Interaction log implementations for Parley.
//!
//! Every backend implements `parley_core::InteractionLog` and serializes
//! its appends, so one log can be shared by several sessions.

pub mod file_backend;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file_backend::FileLog;
pub use in_memory::InMemoryLog;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLog;

use parley_config::LogConfig;
use parley_core::error::LogError;
use parley_core::log::InteractionLog;
use std::sync::Arc;

/// Open the backend selected by `[log] backend`.
pub async fn build_from_config(config: &LogConfig) -> Result<Arc<dyn InteractionLog>, LogError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryLog::new())),
        "file" => Ok(Arc::new(FileLog::open(config.resolved_path()).await?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.resolved_path();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    LogError::Storage(format!("Failed to create log directory: {e}"))
                })?;
            }
            let url = format!("sqlite://{}", path.display());
            Ok(Arc::new(SqliteLog::new(&url).await?))
        }
        other => Err(LogError::Storage(format!(
            "log backend '{other}' is not available in this build"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_memory_backend() {
        let config = LogConfig {
            backend: "memory".into(),
            path: None,
        };
        let log = build_from_config(&config).await.unwrap();
        assert_eq!(log.name(), "in_memory");
    }

    #[tokio::test]
    async fn builds_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            backend: "file".into(),
            path: Some(dir.path().join("log.jsonl").display().to_string()),
        };
        let log = build_from_config(&config).await.unwrap();
        assert_eq!(log.name(), "file");
        assert_eq!(log.append("Hello", "Hi there").await.unwrap(), 1);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn builds_sqlite_backend_in_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            backend: "sqlite".into(),
            path: Some(dir.path().join("nested/log.db").display().to_string()),
        };
        let log = build_from_config(&config).await.unwrap();
        assert_eq!(log.name(), "sqlite");
        assert_eq!(log.append("Hello", "Hi there").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_backend_errors() {
        let config = LogConfig {
            backend: "postgres".into(),
            path: None,
        };
        assert!(build_from_config(&config).await.is_err());
    }
}
