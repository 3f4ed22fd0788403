//! Running token and cost totals for one session.

use serde::{Deserialize, Serialize};

/// Cumulative usage of a session. Only ever grows; reset by restarting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    total_tokens: u64,
    cost_usd: f64,
    requests: u64,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one successful completion.
    ///
    /// Negative or NaN costs are counted as zero so the totals never shrink.
    pub fn record(&mut self, tokens: u32, cost_usd: f64) {
        self.total_tokens = self.total_tokens.saturating_add(u64::from(tokens));
        if cost_usd.is_finite() && cost_usd > 0.0 {
            self.cost_usd += cost_usd;
        }
        self.requests += 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn cost_usd(&self) -> f64 {
        self.cost_usd
    }

    /// Number of completions recorded.
    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl std::fmt::Display for UsageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total Tokens Used: {} | Cost in USD: ${:.6}",
            self.total_tokens, self.cost_usd
        )
    }
}
