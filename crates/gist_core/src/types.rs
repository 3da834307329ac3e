use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LENGTH: usize = 150;
pub const DEFAULT_MIN_LENGTH: usize = 30;
pub const DEFAULT_NUM_BEAMS: usize = 4;
pub const DEFAULT_LENGTH_PENALTY: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub text: String,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min_length: Option<usize>,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_length: None,
            min_length: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.max_length.unwrap_or(DEFAULT_MAX_LENGTH),
            min_length: self.min_length.unwrap_or(DEFAULT_MIN_LENGTH),
            ..GenerationParams::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SummaryResponse {
    pub fn generated(summary: String) -> Self {
        Self { summary, warning: None }
    }

    pub fn with_warning(summary: String, warning: impl Into<String>) -> Self {
        Self {
            summary,
            warning: Some(warning.into()),
        }
    }
}

/// Decoding settings handed to the model. Lengths count decoder tokens,
/// including the decoder start token.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: usize,
    pub length_penalty: f64,
    pub early_stopping: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
            num_beams: DEFAULT_NUM_BEAMS,
            length_penalty: DEFAULT_LENGTH_PENALTY,
            early_stopping: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok".to_string() }
    }
}
