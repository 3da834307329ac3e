pub mod models;
pub mod error;
pub mod types;

pub use error::Error;
pub use models::InferenceModel;
pub use types::{GenerationParams, HealthResponse, SummaryRequest, SummaryResponse};

pub type Result<T> = std::result::Result<T, Error>;
