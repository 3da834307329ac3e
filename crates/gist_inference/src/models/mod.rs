use std::sync::Arc;
use gist_core::{Error, InferenceModel, Result};
use tracing::{error, info, warn};

use crate::weights::ensure_weights;
use crate::Config;

pub mod dummy;
pub mod t5;
pub mod unavailable;

pub use dummy::DummyModel;
pub use t5::T5Model;
pub use unavailable::UnavailableModel;

/// Build the configured model. A T5 model that fails to load is replaced by
/// [`UnavailableModel`] so the service still starts and answers with the
/// fallback summary.
pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    match config.model_name.to_lowercase().as_str() {
        "t5" => {
            if let Err(e) = ensure_weights(&config.weights_path, config.weights_url.as_ref()).await {
                warn!("Failed to download weights: {}", e);
            }
            let loading = config.clone();
            let loaded = tokio::task::spawn_blocking(move || T5Model::load(&loading))
                .await
                .map_err(|e| Error::Inference(format!("model loading task failed: {}", e)))?;
            match loaded {
                Ok(model) => Ok(Arc::new(model)),
                Err(e) => {
                    error!("Error loading model {}: {}", config.base_model, e);
                    Ok(Arc::new(UnavailableModel::new(e.to_string())))
                }
            }
        }
        "dummy" => {
            info!("Using dummy model, summaries are the leading words of the input");
            Ok(Arc::new(DummyModel::new(None).await?))
        }
        other => Err(Error::Config(format!(
            "Unknown model '{}'. Available models: t5 (default), dummy",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_dummy_model() {
        let config = Config {
            model_name: "Dummy".to_string(),
            ..Config::default()
        };
        let model = create_model(Some(config)).await.unwrap();
        assert_eq!(model.name(), "Dummy");
    }

    #[tokio::test]
    async fn test_unknown_model_is_rejected() {
        let config = Config {
            model_name: "gpt".to_string(),
            ..Config::default()
        };
        let err = create_model(Some(config)).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
