use axum::http::HeaderValue;
use gist_core::{Error, Result};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

pub const ANY_ORIGIN: &str = "*";

/// CORS for the frontend. `*` (or an empty setting) reflects whatever origin
/// asks; otherwise only the listed, comma-separated origins are allowed.
/// Credentials are allowed in both cases, so wildcards are never sent.
pub fn cors_layer(frontend_origin: &str) -> Result<CorsLayer> {
    let origins: Vec<&str> = frontend_origin
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect();

    let allow_origin = if origins.is_empty() || origins.contains(&ANY_ORIGIN) {
        AllowOrigin::mirror_request()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| Error::Config(format!("Invalid FRONTEND_ORIGIN '{}': {}", origin, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_wildcard_and_lists() {
        assert!(cors_layer("*").is_ok());
        assert!(cors_layer("").is_ok());
        assert!(cors_layer("http://localhost:3000, https://app.example.com").is_ok());
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        let err = cors_layer("http://bad\norigin").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
