//! Completion client — one prompt in, one priced reply out.

use parley_config::AppConfig;
use parley_core::error::ProviderError;
use parley_core::provider::{Provider, ProviderRequest};
use parley_telemetry::{ModelPricing, PricingTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The result of one successful completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub reply_text: String,
    pub tokens_used: u32,
    pub cost_usd: f64,
    /// Which model actually responded
    pub model: String,
}

/// Wraps a [`Provider`] with the model settings and pricing of a session.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    pricing: PricingTable,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(120),
            pricing: PricingTable::with_defaults(),
        }
    }

    /// Model settings, timeout and pricing overrides from config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.model_name.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_pricing(pricing_from_config(config))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Send `prompt` as a single user message and wait for the reply.
    ///
    /// No retries. A call that outlives the timeout fails as `Transient`.
    pub async fn complete(&self, prompt: &str) -> Result<Completion, ProviderError> {
        let mut request = ProviderRequest::from_prompt(self.model.clone(), prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Transient(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let usage = response.usage.unwrap_or_default();
        let cost_usd = self.pricing.compute_cost(
            self.priced_model(&response.model),
            usage.prompt_tokens,
            usage.completion_tokens,
        );

        debug!(
            model = %response.model,
            tokens = usage.total_tokens,
            cost_usd,
            "Completion received"
        );

        Ok(Completion {
            reply_text: response.message.content,
            tokens_used: usage.total_tokens,
            cost_usd,
            model: response.model,
        })
    }

    /// The configured model name when it has a price, else the name the
    /// provider echoed back.
    fn priced_model<'a>(&'a self, responded_model: &'a str) -> &'a str {
        if self.pricing.resolve(&self.model).is_some() {
            &self.model
        } else {
            responded_model
        }
    }
}

/// Built-in prices with `[pricing."model"]` entries layered on top.
pub fn pricing_from_config(config: &AppConfig) -> PricingTable {
    let mut table = PricingTable::with_defaults();
    for (model, price) in &config.pricing {
        table.set(model.clone(), ModelPricing::new(price.input_per_m, price.output_per_m));
    }
    table
}
