use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use candle_core::{DType, Device, Tensor, D};
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use gist_core::{Error, GenerationParams, InferenceModel, Result};
use hf_hub::api::sync::Api;
use tracing::{debug, info, warn};

use crate::beam::{BeamSearch, DecoderStep};
use crate::tokenizer::SummaryTokenizer;
use crate::weights::open_checkpoint;
use crate::Config;

// T5 activations overflow in half precision.
const DTYPE: DType = DType::F32;

fn candle_err(e: candle_core::Error) -> Error {
    Error::Inference(e.to_string())
}

#[derive(Debug, Clone)]
pub enum WeightsSource {
    Base(String),
    FineTuned(PathBuf),
}

impl fmt::Display for WeightsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightsSource::Base(repo) => write!(f, "base weights from {}", repo),
            WeightsSource::FineTuned(path) => write!(f, "fine-tuned weights from {}", path.display()),
        }
    }
}

struct Loaded {
    model: T5ForConditionalGeneration,
    tokenizer: SummaryTokenizer,
    device: Device,
    start_token: u32,
    eos_token: u32,
}

impl Loaded {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String> {
        let input_ids = self.tokenizer.encode(text)?;
        debug!("Encoded input into {} tokens", input_ids.len());

        // Tensors are reference counted, so this clone shares the weights.
        let mut model = self.model.clone();
        let input = Tensor::new(input_ids.as_slice(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(candle_err)?;
        let encoder_output = model.encode(&input).map_err(candle_err)?;

        let mut step = T5Step {
            model: &mut model,
            encoder_output,
            expanded: None,
            device: &self.device,
        };
        let output_ids = BeamSearch::new(params, self.start_token, self.eos_token).run(&mut step)?;
        self.tokenizer.decode(&output_ids)
    }
}

/// One decoder pass per step over the whole beam. The key/value cache is
/// disabled so every beam can be re-fed its full prefix.
struct T5Step<'a> {
    model: &'a mut T5ForConditionalGeneration,
    encoder_output: Tensor,
    expanded: Option<(usize, Tensor)>,
    device: &'a Device,
}

impl T5Step<'_> {
    fn encoder_output_for(&mut self, batch: usize) -> Result<Tensor> {
        if let Some((size, tensor)) = &self.expanded {
            if *size == batch {
                return Ok(tensor.clone());
            }
        }
        let tensor = self.encoder_output.repeat((batch, 1, 1)).map_err(candle_err)?;
        self.expanded = Some((batch, tensor.clone()));
        Ok(tensor)
    }
}

impl DecoderStep for T5Step<'_> {
    fn next_log_probs(&mut self, sequences: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        let batch = sequences.len();
        let seq_len = sequences.first().map(Vec::len).unwrap_or(0);
        let flat: Vec<u32> = sequences.concat();
        let decoder_ids = Tensor::from_vec(flat, (batch, seq_len), self.device).map_err(candle_err)?;
        let encoder_output = self.encoder_output_for(batch)?;

        let logits = self
            .model
            .decode(&decoder_ids, &encoder_output)
            .and_then(|l| l.to_dtype(DType::F32))
            .map_err(candle_err)?;
        candle_nn::ops::log_softmax(&logits, D::Minus1)
            .and_then(|lp| lp.to_vec2::<f32>())
            .map_err(candle_err)
    }
}

/// Pretrained T5 served through beam search.
pub struct T5Model {
    inner: Arc<Loaded>,
    base_model: String,
    weights: WeightsSource,
}

impl fmt::Debug for T5Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("T5Model")
            .field("base_model", &self.base_model)
            .field("weights", &self.weights)
            .field("device", &self.inner.device)
            .finish()
    }
}

impl T5Model {
    /// Load config, tokenizer and weights. Blocks on hub downloads.
    pub fn load(config: &Config) -> Result<Self> {
        let device = select_device(config.force_cpu)?;
        info!("Loading {} on {:?}", config.base_model, device);

        let api = Api::new().map_err(|e| Error::Weights(e.to_string()))?;
        let repo = api.model(config.base_model.clone());
        let fetch = |file: &str| {
            repo.get(file)
                .map_err(|e| Error::Weights(format!("{}/{}: {}", config.base_model, file, e)))
        };

        let mut t5_config: t5::Config = serde_json::from_str(&std::fs::read_to_string(fetch("config.json")?)?)?;
        t5_config.use_cache = false;

        let tokenizer = SummaryTokenizer::from_file(
            &fetch("tokenizer.json")?,
            config.max_input_tokens,
            &config.task_prefix,
        )?;
        info!("Successfully loaded tokenizer");

        let (model, weights) = match load_fine_tuned(&config.weights_path, &t5_config, &device) {
            Some(model) => (model, WeightsSource::FineTuned(config.weights_path.clone())),
            None => {
                let vb = open_checkpoint(&fetch("model.safetensors")?, DTYPE, &device)?;
                let model = T5ForConditionalGeneration::load(vb, &t5_config).map_err(candle_err)?;
                (model, WeightsSource::Base(config.base_model.clone()))
            }
        };
        info!("T5 model ready ({})", weights);

        let start_token = t5_config.decoder_start_token_id.unwrap_or(t5_config.pad_token_id) as u32;
        let eos_token = t5_config.eos_token_id as u32;
        Ok(Self {
            inner: Arc::new(Loaded {
                model,
                tokenizer,
                device,
                start_token,
                eos_token,
            }),
            base_model: config.base_model.clone(),
            weights,
        })
    }
}

fn select_device(force_cpu: bool) -> Result<Device> {
    if force_cpu {
        return Ok(Device::Cpu);
    }
    Device::cuda_if_available(0).map_err(candle_err)
}

fn load_fine_tuned(path: &Path, config: &t5::Config, device: &Device) -> Option<T5ForConditionalGeneration> {
    if !path.exists() {
        info!(
            "Model weights not found at {:?}. Continuing with base T5 weights (no fine-tuned checkpoint).",
            path
        );
        return None;
    }
    let loaded = open_checkpoint(path, DTYPE, device)
        .and_then(|vb| T5ForConditionalGeneration::load(vb, config).map_err(candle_err));
    match loaded {
        Ok(model) => {
            info!("Loaded fine-tuned weights from: {:?}", path);
            Some(model)
        }
        Err(e) => {
            warn!("Failed to load fine-tuned weights from {:?}: {}", path, e);
            warn!("Continuing with base T5 weights.");
            None
        }
    }
}

#[async_trait::async_trait]
impl InferenceModel for T5Model {
    fn name(&self) -> &str {
        "T5"
    }

    async fn generate(&self, text: &str, params: &GenerationParams) -> Result<String> {
        let inner = self.inner.clone();
        let text = text.to_string();
        let params = params.clone();
        tokio::task::spawn_blocking(move || inner.summarize(&text, &params))
            .await
            .map_err(|e| Error::Inference(format!("generation task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_cpu_device() {
        assert!(matches!(select_device(true).unwrap(), Device::Cpu));
    }

    #[test]
    fn test_missing_fine_tuned_weights_fall_back_to_base() {
        let config: t5::Config = serde_json::from_str(
            r#"{
                "vocab_size": 32, "d_model": 8, "d_kv": 4, "d_ff": 16,
                "num_layers": 1, "num_heads": 2,
                "relative_attention_num_buckets": 8, "dropout_rate": 0.1,
                "layer_norm_epsilon": 1e-6, "initializer_factor": 1.0,
                "feed_forward_proj": "relu", "is_encoder_decoder": true,
                "pad_token_id": 0, "eos_token_id": 1
            }"#,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("model_weight.pth");
        assert!(load_fine_tuned(&missing, &config, &Device::Cpu).is_none());

        let corrupt = dir.path().join("broken.safetensors");
        std::fs::write(&corrupt, b"not a checkpoint").unwrap();
        assert!(load_fine_tuned(&corrupt, &config, &Device::Cpu).is_none());
    }

    #[test]
    fn test_weights_source_display() {
        let base = WeightsSource::Base("google-t5/t5-small".to_string());
        assert_eq!(base.to_string(), "base weights from google-t5/t5-small");
        let tuned = WeightsSource::FineTuned(PathBuf::from("model_weight.pth"));
        assert_eq!(tuned.to_string(), "fine-tuned weights from model_weight.pth");
    }
}
