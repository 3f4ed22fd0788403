//! Error types for the Parley domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Network failure, timeout, 5xx or an unreadable body.
    #[error("Transient failure: {0}")]
    Transient(String),
}

impl ProviderError {
    /// Whether resubmitting the same input may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited { .. })
    }

    /// Whether the session cannot continue without the user reconfiguring.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::NotConfigured(_))
    }

    /// Backoff hint, when the provider gave one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum LogError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("prompt template is missing the required slot {{{0}}}")]
    MissingSlot(String),

    #[error("prompt template contains unknown slot {{{0}}}")]
    UnknownSlot(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 404,
            message: "model not found".into(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn rate_limit_is_retryable_with_hint() {
        let err = ProviderError::RateLimited { retry_after_secs: 7 };
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
        assert_eq!(err.retry_after_secs(), Some(7));
        assert!(err.to_string().contains("7s"));
    }

    #[test]
    fn auth_failure_is_fatal() {
        let err = ProviderError::AuthenticationFailed("bad key".into());
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
        assert_eq!(err.retry_after_secs(), None);
    }

    #[test]
    fn template_error_names_slot() {
        let err = TemplateError::MissingSlot("question".into());
        assert_eq!(
            err.to_string(),
            "prompt template is missing the required slot {question}"
        );
    }
}
