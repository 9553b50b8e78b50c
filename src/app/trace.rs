use crate::utils::telemetry;
use axum::{body::Body, http::Request};
use tracing::Span;

/// 每個請求的根 span，延續呼叫端帶來的 W3C trace context
pub fn request_span(request: &Request<Body>) -> Span {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        uri = %request.uri(),
    );
    telemetry::set_parent_from_headers(&span, request.headers());
    span
}
