use std::path::Path;

use gist_core::{Error, Result};
use tokenizers::{Tokenizer as HfTokenizer, TruncationParams};
use tracing::debug;

/// Tokenizer that adds the task prefix and truncates long inputs.
#[derive(Clone)]
pub struct SummaryTokenizer {
    inner: HfTokenizer,
    prefix: String,
}

impl std::fmt::Debug for SummaryTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryTokenizer")
            .field("prefix", &self.prefix)
            .field("vocab_size", &self.inner.get_vocab_size(true))
            .finish()
    }
}

impl SummaryTokenizer {
    pub fn from_file(path: &Path, max_input_tokens: usize, prefix: &str) -> Result<Self> {
        let inner = HfTokenizer::from_file(path).map_err(|e| Error::Tokenization(e.to_string()))?;
        debug!("Loaded tokenizer from {:?}", path);
        Self::new(inner, max_input_tokens, prefix)
    }

    pub fn new(mut inner: HfTokenizer, max_input_tokens: usize, prefix: &str) -> Result<Self> {
        inner
            .with_truncation(Some(TruncationParams {
                max_length: max_input_tokens,
                ..Default::default()
            }))
            .map_err(|e| Error::Tokenization(e.to_string()))?;
        Ok(Self {
            inner,
            prefix: prefix.to_string(),
        })
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let input = format!("{}{}", self.prefix, text);
        let encoding = self
            .inner
            .encode(input, true)
            .map_err(|e| Error::Tokenization(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, true)
            .map_err(|e| Error::Tokenization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENIZER_JSON: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "WhitespaceSplit"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"<unk>": 0, "summarize:": 1, "the": 2, "cat": 3, "sat": 4},
            "unk_token": "<unk>"
        }
    }"#;

    fn tokenizer(max_input_tokens: usize) -> SummaryTokenizer {
        let inner = HfTokenizer::from_bytes(TOKENIZER_JSON.as_bytes()).unwrap();
        SummaryTokenizer::new(inner, max_input_tokens, "summarize: ").unwrap()
    }

    #[test]
    fn test_encode_adds_prefix() {
        let ids = tokenizer(512).encode("the cat sat").unwrap();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_encode_truncates() {
        // the prefix token counts toward the cap
        let ids = tokenizer(3).encode("the cat sat the cat sat").unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode() {
        let text = tokenizer(512).decode(&[2, 3, 4]).unwrap();
        assert_eq!(text, "the cat sat");
    }
}
