//! The conversation session — the heart of Parley.
//!
//! One accepted user input flows through:
//!
//! 1. **Guard** the input (empty or repeated text is ignored)
//! 2. **Render** the bounded history window
//! 3. **Assemble** the prompt from the instruction template
//! 4. **Complete** it via the configured provider
//! 5. **Update** history, the interaction log and usage totals
//!
//! A failed completion changes nothing, so the user can simply resend.

pub mod client;
pub mod history;
pub mod prompt;
pub mod session;
pub mod token;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Completion, CompletionClient, pricing_from_config};
pub use history::{HistoryBuffer, HistoryWindow};
pub use prompt::PromptTemplate;
pub use session::{IgnoreReason, Session, SessionState, SubmitOutcome};
