use async_trait::async_trait;
use std::fmt;
use crate::types::GenerationParams;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Generate a summary for raw input text. The task prefix and input
    /// truncation are the model's responsibility.
    async fn generate(&self, text: &str, params: &GenerationParams) -> Result<String>;
}
