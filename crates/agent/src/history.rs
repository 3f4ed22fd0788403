//! Conversation history and the bounded window rendered into prompts.
//!
//! The buffer is an ordered list of [`Turn`]s. Pairs are formed from the
//! start of the conversation: (turn 0, turn 1), (turn 2, turn 3), ... A
//! trailing unpaired turn never appears in a window.
//!
//! Older pairs simply fall out of the window. Nothing is summarised.

use crate::token;
use parley_core::message::{Role, Turn};
use std::fmt;

/// The running conversation of one session.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    turns: Vec<Turn>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Always succeeds; input validation happens upstream.
    pub fn record(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of complete turn pairs.
    pub fn pair_count(&self) -> usize {
        self.turns.len() / 2
    }

    /// Text of the most recent user turn, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role() == Role::User)
            .map(Turn::text)
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The last `limit_k` complete pairs, oldest first.
    pub fn render_window(&self, limit_k: usize) -> HistoryWindow<'_> {
        let pairs = self.pair_count();
        let take = limit_k.min(pairs);
        let start = (pairs - take) * 2;
        HistoryWindow {
            turns: &self.turns[start..pairs * 2],
        }
    }

    /// Like [`render_window`](Self::render_window), then drops the oldest
    /// pairs until the rendered text is estimated at `max_tokens` or fewer.
    ///
    /// `max_tokens == 0` disables the cap.
    pub fn render_window_within(&self, limit_k: usize, max_tokens: usize) -> HistoryWindow<'_> {
        let mut window = self.render_window(limit_k);
        if max_tokens == 0 {
            return window;
        }
        while !window.is_empty() && window.estimated_tokens() > max_tokens {
            window = window.without_oldest_pair();
        }
        window
    }
}

/// A bounded, borrowed view over complete turn pairs.
///
/// The view is `Copy`; every call to [`pairs`](Self::pairs) or
/// [`lines`](Self::lines) starts a fresh pass.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow<'a> {
    // Always an even number of turns
    turns: &'a [Turn],
}

impl<'a> HistoryWindow<'a> {
    /// (user turn, assistant turn) pairs, oldest first.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a Turn, &'a Turn)> + Clone + use<'a> {
        self.turns.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// One `"Role: text"` line per turn, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = String> + Clone + use<'a> {
        self.turns.iter().map(Turn::to_string)
    }

    pub fn turns(&self) -> &'a [Turn] {
        self.turns
    }

    pub fn pair_count(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Byte length of [`to_text`](Self::to_text) without building it.
    pub fn rendered_len(&self) -> usize {
        let lines: usize = self
            .turns
            .iter()
            .map(|t| t.role().prompt_label().len() + 2 + t.text().len())
            .sum();
        lines + self.turns.len().saturating_sub(1)
    }

    pub fn estimated_tokens(&self) -> usize {
        token::estimate_tokens_for_len(self.rendered_len())
    }

    /// The window as one newline-separated block.
    pub fn to_text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    fn without_oldest_pair(self) -> Self {
        Self {
            turns: &self.turns[2..],
        }
    }
}

impl fmt::Display for HistoryWindow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, turn) in self.turns.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{turn}")?;
        }
        Ok(())
    }
}
