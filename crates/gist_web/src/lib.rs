use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod cors;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState, frontend_origin: &str) -> gist_core::Result<Router> {
    let cors = cors::cors_layer(frontend_origin)?;

    Ok(Router::new()
        .route("/summarize", post(handlers::summarize))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state)))
}

pub mod prelude {
    pub use gist_core::{Error, Result, SummaryRequest, SummaryResponse};
    pub use crate::{create_app, AppState};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use gist_inference::models::{DummyModel, UnavailableModel};
    use gist_inference::Summarizer;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(model: Arc<dyn gist_core::InferenceModel>, origin: &str) -> Router {
        create_app(AppState::new(Summarizer::new(model)), origin).unwrap()
    }

    fn app() -> Router {
        app_with(Arc::new(DummyModel), "*")
    }

    fn summarize_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/summarize")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_summarize() {
        let response = app()
            .oneshot(summarize_request(json!({"text": "A short note about axum routers."})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"summary": "A short note about axum routers."})
        );
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        for text in ["", "   \n"] {
            let response = app()
                .oneshot(summarize_request(json!({"text": text, "max_length": 50})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(response).await,
                json!({"detail": "Text cannot be empty"})
            );
        }
    }

    #[tokio::test]
    async fn test_fallback_carries_warning() {
        let text = (0..120).map(|i| format!("t{}", i)).collect::<Vec<_>>().join(" ");
        let response = app_with(Arc::new(UnavailableModel::new("offline")), "*")
            .oneshot(summarize_request(json!({"text": text})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["warning"], "Using fallback summarization");
        let summary = body["summary"].as_str().unwrap();
        assert!(summary.ends_with("... [Summary truncated]"));
        assert!(summary.starts_with("t0 t1 t2"));
    }

    #[tokio::test]
    async fn test_missing_text_is_rejected() {
        let response = app()
            .oneshot(summarize_request(json!({"max_length": 10})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_cors_allow_list() {
        let app = app_with(Arc::new(DummyModel), "http://localhost:3000");

        let allowed = Request::get("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(allowed).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );

        let other = Request::get("/health")
            .header(header::ORIGIN, "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(other).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_cors_wildcard_reflects_origin() {
        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/summarize")
            .header(header::ORIGIN, "http://frontend.local")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(preflight).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://frontend.local"
        );
    }
}
