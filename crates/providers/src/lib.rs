//! Hosted LLM provider implementations for Parley.
//!
//! All providers implement the `parley_core::Provider` trait.
//! The router picks and builds the configured provider at startup.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, default_base_url};
