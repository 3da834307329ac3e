use std::path::PathBuf;
use url::Url;

pub mod beam;
pub mod fallback;
pub mod models;
pub mod summarizer;
pub mod tokenizer;
pub mod weights;

pub const DEFAULT_MODEL: &str = "t5";
pub const DEFAULT_BASE_MODEL: &str = "google-t5/t5-base";
pub const DEFAULT_WEIGHTS_PATH: &str = "model_weight.pth";
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 512;
pub const DEFAULT_TASK_PREFIX: &str = "summarize: ";

#[derive(Debug, Clone)]
pub struct Config {
    /// Which model implementation to build (`t5` or `dummy`).
    pub model_name: String,
    /// Hub repository providing config.json, tokenizer.json and base weights.
    pub base_model: String,
    /// Fine-tuned checkpoint, loaded over the base weights when present.
    pub weights_path: PathBuf,
    pub weights_url: Option<Url>,
    pub max_input_tokens: usize,
    pub task_prefix: String,
    pub force_cpu: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            base_model: DEFAULT_BASE_MODEL.to_string(),
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            weights_url: None,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            task_prefix: DEFAULT_TASK_PREFIX.to_string(),
            force_cpu: false,
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::summarizer::Summarizer;
    pub use gist_core::{Error, GenerationParams, Result, SummaryRequest, SummaryResponse};
}

pub use models::create_model;
pub use summarizer::Summarizer;
