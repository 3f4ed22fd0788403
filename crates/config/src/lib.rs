//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The instruction template used when the config does not set one.
pub const DEFAULT_INSTRUCTION_TEMPLATE: &str = "You are a kind agent, you help humans with real-time questions
and you answer their questions with patience and politeness.
chat history: {chat_history}
Human: {question}
AI:";

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API credential. Usually supplied through the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Which hosted provider to talk to ("openai", "openrouter", "ollama", or custom)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL override; required for custom providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model to request completions from
    #[serde(default = "default_model")]
    pub model_name: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of recent turn-pairs included in each prompt
    #[serde(default = "default_history_window_k")]
    pub history_window_k: usize,

    /// Token cap on the rendered history window (0 = no cap)
    #[serde(default = "default_history_token_budget")]
    pub history_token_budget: usize,

    /// Fixed prompt layout with `{chat_history}` and `{question}` slots
    #[serde(default = "default_instruction_template")]
    pub instruction_template: String,

    /// Interaction log configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Custom model pricing overrides (model name → pricing)
    #[serde(default)]
    pub pricing: HashMap<String, PricingOverrideConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    256
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_history_window_k() -> usize {
    5
}
fn default_history_token_budget() -> usize {
    3000
}
fn default_instruction_template() -> String {
    DEFAULT_INSTRUCTION_TEMPLATE.into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("history_window_k", &self.history_window_k)
            .field("history_token_budget", &self.history_token_budget)
            .field("instruction_template", &self.instruction_template)
            .field("log", &self.log)
            .field("pricing", &self.pricing)
            .finish()
    }
}

/// Which interaction log backend to use, and where it lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// "sqlite", "file", or "memory"
    #[serde(default = "default_log_backend")]
    pub backend: String,

    /// Storage location. Defaults to a file under the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_log_backend() -> String {
    "sqlite".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            backend: default_log_backend(),
            path: None,
        }
    }
}

impl LogConfig {
    /// The storage path, falling back to the per-backend default.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return PathBuf::from(path);
        }
        let file = match self.backend.as_str() {
            "file" => "interactions.jsonl",
            _ => "interactions.db",
        };
        AppConfig::config_dir().join(file)
    }
}

/// Custom per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOverrideConfig {
    /// Price per 1M input tokens in USD
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD
    pub output_per_m: f64,
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    ///
    /// Also checks environment variables:
    /// - `PARLEY_API_KEY`, then `OPENAI_API_KEY` (only when the file has no key)
    /// - `PARLEY_PROVIDER`
    /// - `PARLEY_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_at(&Self::config_path())
    }

    /// Like [`load`](Self::load), from an explicit file.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("PARLEY_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("PARLEY_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("PARLEY_MODEL") {
            self.model_name = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Default location of `config.toml`.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if !matches!(self.log.backend.as_str(), "sqlite" | "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "log.backend must be one of sqlite, file, memory (got '{}')",
                self.log.backend
            )));
        }

        for (model, price) in &self.pricing {
            if price.input_per_m < 0.0 || price.output_per_m < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "pricing for '{model}' must not be negative"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model_name: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            history_window_k: default_history_window_k(),
            history_token_budget: default_history_token_budget(),
            instruction_template: default_instruction_template(),
            log: LogConfig::default(),
            pricing: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.history_window_k, 5);
        assert_eq!(config.log.backend, "sqlite");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_at_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "history_window_k = 2\n").unwrap();

        let config = AppConfig::load_at(&path).unwrap();
        assert_eq!(config.history_window_k, 2);
        assert_eq!(AppConfig::config_path().file_name().unwrap(), "config.toml");
    }

    #[test]
    fn default_template_has_both_slots() {
        assert!(DEFAULT_INSTRUCTION_TEMPLATE.contains("{chat_history}"));
        assert!(DEFAULT_INSTRUCTION_TEMPLATE.contains("{question}"));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model_name, config.model_name);
        assert_eq!(parsed.instruction_template, config.instruction_template);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_temperature_rejected() {
        let parsed: AppConfig = toml::from_str("temperature = nan").unwrap();
        assert!(parsed.temperature.is_nan());
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_backend_rejected() {
        let mut config = AppConfig::default();
        config.log.backend = "postgres".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.model_name, "gpt-4o-mini");
    }

    #[test]
    fn load_from_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model_name = "gpt-3.5-turbo"
history_window_k = 3

[log]
backend = "file"
path = "/tmp/parley-log.jsonl"

[pricing."my/model"]
input_per_m = 1.0
output_per_m = 2.0
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model_name, "gpt-3.5-turbo");
        assert_eq!(config.history_window_k, 3);
        assert_eq!(config.log.backend, "file");
        assert_eq!(
            config.log.resolved_path(),
            PathBuf::from("/tmp/parley-log.jsonl")
        );
        assert!((config.pricing["my/model"].output_per_m - 2.0).abs() < 1e-10);
        // Untouched keys keep their defaults
        assert_eq!(config.provider, "openai");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "history_window_k = \"five\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_key_fallback_order() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "PARLEY_API_KEY" => Some("sk-parley".into()),
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-parley"));

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "OPENAI_API_KEY" => Some("sk-openai".into()),
            "PARLEY_MODEL" => Some("gpt-4o".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.model_name, "gpt-4o");
        assert!(config.has_api_key());
    }

    #[test]
    fn file_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|_| Some("sk-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("history_window_k = 5"));
    }
}
