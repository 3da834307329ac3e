use std::fmt;
use gist_core::{GenerationParams, InferenceModel, Result};
use crate::Config;

const SUMMARY_WORDS: usize = 20;

/// Returns the leading words of the input. Useful without model weights.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub async fn new(_config: Option<Config>) -> Result<Self> {
        Ok(Self)
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, text: &str, params: &GenerationParams) -> Result<String> {
        // max_length counts the decoder start token
        let limit = SUMMARY_WORDS.min(params.max_length.saturating_sub(1)).max(1);
        let words: Vec<&str> = text.split_whitespace().take(limit).collect();
        Ok(words.join(" "))
    }
}
