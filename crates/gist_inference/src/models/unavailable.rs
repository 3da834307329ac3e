use std::fmt;
use gist_core::{Error, GenerationParams, InferenceModel, Result};

/// Stands in for a model that failed to load. Every call errors.
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl fmt::Debug for UnavailableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnavailableModel")
            .field("reason", &self.reason)
            .finish()
    }
}

#[async_trait::async_trait]
impl InferenceModel for UnavailableModel {
    fn name(&self) -> &str {
        "Unavailable"
    }

    async fn generate(&self, _text: &str, _params: &GenerationParams) -> Result<String> {
        Err(Error::ModelUnavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_always_fails() {
        let model = UnavailableModel::new("no weights");
        let err = model
            .generate("some text", &GenerationParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Model unavailable: no weights");
    }
}
