//! Input channels for Parley.
//!
//! A channel turns some input source into a stream of user messages.
//! Only the terminal channel ships today.

pub mod cli;

pub use cli::CliChannel;
