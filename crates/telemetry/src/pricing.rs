//! Built-in pricing table for common hosted models.
//!
//! Prices are in USD per 1 million tokens. Each model has an input and
//! output price. Custom pricing from the TOML config is layered on top at
//! startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    /// Create a new pricing entry.
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 * self.input_per_m + output_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }
}

/// Provider prefixes tried when a bare model name misses.
const PROVIDER_PREFIXES: [&str; 5] = ["openai", "anthropic", "google", "mistral", "meta-llama"];

/// Pricing table with built-in defaults and custom overrides.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        // ── OpenAI ─────────────────────────────────────────────────
        prices.insert("openai/gpt-4o".into(), ModelPricing::new(2.5, 10.0));
        prices.insert("openai/gpt-4o-mini".into(), ModelPricing::new(0.15, 0.6));
        prices.insert("openai/gpt-4-turbo".into(), ModelPricing::new(10.0, 30.0));
        prices.insert("openai/gpt-3.5-turbo".into(), ModelPricing::new(0.5, 1.5));
        prices.insert(
            "openai/gpt-3.5-turbo-instruct".into(),
            ModelPricing::new(1.5, 2.0),
        );
        prices.insert("openai/text-davinci-003".into(), ModelPricing::new(20.0, 20.0));
        prices.insert("openai/o3-mini".into(), ModelPricing::new(1.1, 4.4));

        // ── Anthropic ──────────────────────────────────────────────
        prices.insert(
            "anthropic/claude-3.5-sonnet".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "anthropic/claude-3.5-haiku".into(),
            ModelPricing::new(0.8, 4.0),
        );

        // ── Google ─────────────────────────────────────────────────
        prices.insert(
            "google/gemini-2.0-flash".into(),
            ModelPricing::new(0.1, 0.4),
        );
        prices.insert("google/gemini-1.5-pro".into(), ModelPricing::new(1.25, 5.0));

        // ── Meta (via OpenRouter) ──────────────────────────────────
        prices.insert(
            "meta-llama/llama-3.1-70b".into(),
            ModelPricing::new(0.52, 0.75),
        );
        prices.insert(
            "meta-llama/llama-3.1-8b".into(),
            ModelPricing::new(0.055, 0.055),
        );

        // ── Mistral ────────────────────────────────────────────────
        prices.insert("mistral/mistral-small".into(), ModelPricing::new(0.2, 0.6));

        Self { prices }
    }

    /// Look up pricing for a model by exact name.
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.prices.get(model).copied()
    }

    /// Add or update pricing for a model.
    pub fn set(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.prices.insert(model.into(), pricing);
    }

    /// Resolve the pricing that applies to `model`.
    ///
    /// Tries an exact match, then common provider prefixes
    /// (`gpt-4o` → `openai/gpt-4o`), then the longest known bare name that
    /// prefixes the model (`gpt-4o-mini-2024-07-18` → `gpt-4o-mini`).
    pub fn resolve(&self, model: &str) -> Option<ModelPricing> {
        if let Some(p) = self.prices.get(model) {
            return Some(*p);
        }

        for prefix in PROVIDER_PREFIXES {
            if let Some(p) = self.prices.get(&format!("{prefix}/{model}")) {
                return Some(*p);
            }
        }

        let model_lower = model.to_lowercase();
        let bare_model = model_lower.rsplit('/').next().unwrap_or(&model_lower);

        self.prices
            .iter()
            .filter_map(|(key, pricing)| {
                let bare_key = key.rsplit('/').next().unwrap_or(key).to_lowercase();
                bare_model
                    .starts_with(&bare_key)
                    .then_some((bare_key.len(), *pricing))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, p)| p)
    }

    /// Compute cost for a model call, returning 0.0 if the model is unknown.
    pub fn compute_cost(&self, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        match self.resolve(model) {
            Some(p) => p.cost(input_tokens, output_tokens),
            None => {
                tracing::debug!(model, "No pricing for model, counting cost as 0");
                0.0
            }
        }
    }

    /// List all known model names.
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.prices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of models in the pricing table.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_models() {
        let table = PricingTable::with_defaults();
        assert!(table.len() >= 15);
        assert!(!table.is_empty());
    }

    #[test]
    fn known_model_cost() {
        let table = PricingTable::with_defaults();
        // gpt-4o: $2.5/M input, $10/M output
        // (1000 * 2.5 + 500 * 10.0) / 1M = 0.0075
        let cost = table.compute_cost("openai/gpt-4o", 1000, 500);
        assert!((cost - 0.0075).abs() < 1e-10);
    }

    #[test]
    fn bare_name_matches_provider_prefix() {
        let table = PricingTable::with_defaults();
        // 10 tokens at $20/M = 0.0002
        let cost = table.compute_cost("text-davinci-003", 6, 4);
        assert!((cost - 0.0002).abs() < 1e-12);
    }

    #[test]
    fn dated_model_uses_longest_prefix() {
        let table = PricingTable::with_defaults();
        let dated = table.resolve("gpt-4o-mini-2024-07-18").unwrap();
        assert_eq!(dated, ModelPricing::new(0.15, 0.6));
    }

    #[test]
    fn unknown_model_returns_zero() {
        let table = PricingTable::with_defaults();
        let cost = table.compute_cost("unknown/model-xyz", 1000, 500);
        assert!(cost.abs() < 1e-10);
    }

    #[test]
    fn custom_pricing() {
        let mut table = PricingTable::with_defaults();
        let before = table.len();

        table.set("custom/model", ModelPricing::new(1.0, 2.0));
        assert_eq!(table.len(), before + 1);

        // (1M * 1.0 + 1M * 2.0) / 1M = 3.0
        let cost = table.compute_cost("custom/model", 1_000_000, 1_000_000);
        assert!((cost - 3.0).abs() < 1e-10);
    }

    #[test]
    fn set_overrides_existing() {
        let mut table = PricingTable::with_defaults();
        let old = table.compute_cost("openai/gpt-4o", 1_000_000, 0);
        assert!((old - 2.5).abs() < 1e-10);

        table.set("openai/gpt-4o", ModelPricing::new(5.0, 20.0));
        let new_cost = table.compute_cost("openai/gpt-4o", 1_000_000, 0);
        assert!((new_cost - 5.0).abs() < 1e-10);
    }

    #[test]
    fn list_models_sorted() {
        let table = PricingTable::with_defaults();
        let models = table.models();
        assert!(models.contains(&"openai/gpt-4o-mini".to_string()));
        assert!(models.windows(2).all(|w| w[0] <= w[1]));
    }
}
