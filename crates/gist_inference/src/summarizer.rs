use std::sync::Arc;

use gist_core::{Error, InferenceModel, Result, SummaryRequest, SummaryResponse};
use tracing::{error, info};

use crate::fallback::{truncate_words, FALLBACK_WARNING};

/// Request-level summarization: validation, model call, fallback.
#[derive(Debug, Clone)]
pub struct Summarizer {
    model: Arc<dyn InferenceModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Blank text is the only error. Model failures, including an empty
    /// generation, are answered with the truncated input and a warning.
    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse> {
        if request.is_blank() {
            return Err(Error::EmptyText);
        }
        info!(
            "Received summarization request (text length: {})",
            request.text.chars().count()
        );

        let params = request.generation_params();
        let generated = self
            .model
            .generate(&request.text, &params)
            .await
            .and_then(|summary| {
                if summary.trim().is_empty() {
                    Err(Error::Inference("model produced an empty summary".to_string()))
                } else {
                    Ok(summary)
                }
            });

        match generated {
            Ok(summary) => {
                info!("Generated summary (length: {})", summary.chars().count());
                Ok(SummaryResponse::generated(summary))
            }
            Err(e) => {
                error!("Error in summarization: {}", e);
                Ok(SummaryResponse::with_warning(
                    truncate_words(&request.text),
                    FALLBACK_WARNING,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::TRUNCATION_MARKER;
    use crate::models::{DummyModel, UnavailableModel};
    use gist_core::GenerationParams;

    #[derive(Debug)]
    struct Silent;

    #[async_trait::async_trait]
    impl InferenceModel for Silent {
        fn name(&self) -> &str {
            "Silent"
        }

        async fn generate(&self, _text: &str, _params: &GenerationParams) -> Result<String> {
            Ok("   ".to_string())
        }
    }

    fn long_text(words: usize) -> String {
        (0..words).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let summarizer = Summarizer::new(Arc::new(DummyModel));
        for text in ["", "   ", "\n\t"] {
            let err = summarizer.summarize(&SummaryRequest::new(text)).await.unwrap_err();
            assert!(matches!(err, Error::EmptyText));
        }
    }

    #[tokio::test]
    async fn test_generated_summary_has_no_warning() {
        let summarizer = Summarizer::new(Arc::new(DummyModel));
        let response = summarizer
            .summarize(&SummaryRequest::new("Rust keeps memory safe without a collector."))
            .await
            .unwrap();
        assert_eq!(response.summary, "Rust keeps memory safe without a collector.");
        assert!(response.warning.is_none());
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_truncation() {
        let summarizer = Summarizer::new(Arc::new(UnavailableModel::new("offline")));
        let response = summarizer
            .summarize(&SummaryRequest::new(long_text(150)))
            .await
            .unwrap();

        assert_eq!(response.warning.as_deref(), Some(FALLBACK_WARNING));
        assert!(response.summary.ends_with(TRUNCATION_MARKER));
        let kept = response.summary.trim_end_matches(TRUNCATION_MARKER);
        assert_eq!(kept.split_whitespace().count(), 100);
    }

    #[tokio::test]
    async fn test_short_text_fallback_returns_input() {
        let summarizer = Summarizer::new(Arc::new(UnavailableModel::new("offline")));
        let request = SummaryRequest::new(" short input ");
        let response = summarizer.summarize(&request).await.unwrap();
        assert_eq!(response.summary, " short input ");
        assert!(response.warning.is_some());
    }

    #[tokio::test]
    async fn test_empty_generation_falls_back() {
        let summarizer = Summarizer::new(Arc::new(Silent));
        let response = summarizer
            .summarize(&SummaryRequest::new("non-empty input"))
            .await
            .unwrap();
        assert_eq!(response.summary, "non-empty input");
        assert_eq!(response.warning.as_deref(), Some(FALLBACK_WARNING));
    }

    #[tokio::test]
    async fn test_identical_requests_give_identical_summaries() {
        let summarizer = Summarizer::new(Arc::new(DummyModel));
        let request = SummaryRequest::new(long_text(40));
        let first = summarizer.summarize(&request).await.unwrap();
        let second = summarizer.summarize(&request).await.unwrap();
        assert_eq!(first, second);
    }
}
