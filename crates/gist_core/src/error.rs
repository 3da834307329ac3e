use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Weights error: {0}")]
    Weights(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Text cannot be empty")]
    EmptyText,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for errors caused by the caller's input rather than the model.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::EmptyText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_client_error() {
        assert!(Error::EmptyText.is_client_error());
        assert_eq!(Error::EmptyText.to_string(), "Text cannot be empty");
        assert!(!Error::Inference("boom".to_string()).is_client_error());
    }
}
