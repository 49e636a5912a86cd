// Middleware stack for observability and protection

use axum::{http::StatusCode, BoxError};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::responses::ApiError;

/// Tracing middleware
///
/// One span per request carrying method and path; status and latency are
/// logged on response.
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Body size limit middleware
///
/// Returns 413 Payload Too Large if exceeded
pub fn body_size_limit_layer(limit_bytes: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(limit_bytes)
}

/// Convert errors from the timeout layer into HTTP responses
pub async fn handle_middleware_error(e: BoxError) -> ApiError {
    if e.is::<tower::timeout::error::Elapsed>() {
        ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string())
    } else {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
    }
}
