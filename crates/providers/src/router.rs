//! Provider router — selects and builds the LLM provider named in config.

use crate::openai_compat::OpenAiCompatProvider;
use parley_config::AppConfig;
use parley_core::error::ProviderError;
use parley_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the configured provider.
///
/// Fails with `NotConfigured` when no credential is available for a
/// provider that needs one, or when a custom provider has no `api_url`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();

    let base_url = config
        .api_url
        .clone()
        .or_else(|| default_base_url(name))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{name}' is not a known provider; set api_url in config.toml"
            ))
        })?;

    let api_key = match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => key.to_string(),
        _ if name == "ollama" => "ollama".to_string(),
        _ => {
            return Err(ProviderError::NotConfigured(
                "no API key; set PARLEY_API_KEY or OPENAI_API_KEY".into(),
            ));
        }
    };

    debug!(provider = name, base_url = %base_url, "Building provider");

    Ok(Arc::new(OpenAiCompatProvider::with_timeout(
        name,
        base_url,
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        _ => return None,
    };
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").unwrap().contains("openrouter.ai"));
        assert!(default_base_url("openai").unwrap().contains("api.openai.com"));
        assert!(default_base_url("ollama").unwrap().contains("localhost:11434"));
        assert!(default_base_url("acme").is_none());
    }

    #[test]
    fn build_requires_api_key() {
        let config = AppConfig::default();
        let err = build_from_config(&config).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn build_with_key() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = AppConfig {
            provider: "ollama".into(),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_ok());
    }

    #[test]
    fn custom_provider_needs_url() {
        let mut config = AppConfig {
            provider: "acme".into(),
            api_key: Some("k".into()),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_err());

        config.api_url = Some("https://llm.acme.internal/v1".into());
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "acme");
    }
}
