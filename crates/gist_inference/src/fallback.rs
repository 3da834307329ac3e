//! Word-truncation used when the model cannot produce a summary.

pub const FALLBACK_WORD_LIMIT: usize = 100;
pub const TRUNCATION_MARKER: &str = "... [Summary truncated]";
pub const FALLBACK_WARNING: &str = "Using fallback summarization";

/// Keep the first hundred words of `text`. Shorter inputs are returned as-is.
pub fn truncate_words(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > FALLBACK_WORD_LIMIT {
        words[..FALLBACK_WORD_LIMIT].join(" ") + TRUNCATION_MARKER
    } else {
        text.to_string()
    }
}
