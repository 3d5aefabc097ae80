use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// Restricts CORS to the configured frontend origin, or allows any origin
/// when none is configured.
pub fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "invalid CORS_ALLOWED_ORIGIN, allowing any origin");
            base.allow_origin(Any)
        }
        None => base.allow_origin(Any),
    }
}
