//! Token usage and cost accounting for Parley.
//!
//! A built-in pricing table turns token counts into USD, and
//! [`UsageStats`] keeps the running per-session totals shown to the user.

pub mod pricing;
pub mod usage;

pub use pricing::{ModelPricing, PricingTable};
pub use usage::UsageStats;
