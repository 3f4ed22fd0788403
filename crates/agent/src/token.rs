//! Rough token counts for prompt budgeting.
//!
//! No tokenizer is loaded: a token is taken to be about 4 bytes of text,
//! rounded up. That is close to what BPE vocabularies produce for English.

/// Estimated tokens in `text`.
pub fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_for_len(text.len())
}

/// Estimated tokens for `len` bytes of text.
pub fn estimate_tokens_for_len(len: usize) -> usize {
    len.div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_costs_nothing() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens_for_len(0), 0);
    }

    #[test]
    fn partial_tokens_round_up() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens_for_len(9), 3);
    }

    #[test]
    fn counts_bytes_not_chars() {
        // "é" is two bytes in UTF-8
        assert_eq!(estimate_tokens("éé"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(400)), 100);
    }
}
