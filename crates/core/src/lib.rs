//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley chat assistant.
//! It has no HTTP or storage dependencies; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the session talks to is a trait here. Implementations
//! live in their respective crates:
//! - [`Provider`] — the hosted completion API (`parley-providers`)
//! - [`InteractionLog`] — the append-only review log (`parley-log`)
//! - [`Channel`] — where user input comes from (`parley-channels`)

pub mod channel;
pub mod error;
pub mod log;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelMessage};
pub use error::{ChannelError, LogError, ProviderError, TemplateError};
pub use log::{InteractionLog, LogRecord};
pub use message::{Message, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
