use axum::{extract::State, Json};
use std::sync::Arc;
use gist_core::{HealthResponse, SummaryRequest, SummaryResponse};
use crate::error::ApiError;
use crate::AppState;

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let response = state.summarizer.summarize(&request).await?;
    Ok(Json(response))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
