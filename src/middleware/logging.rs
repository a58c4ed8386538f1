//! Request logging middleware with trace-id propagation

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// Per-request trace identifier, stored as a request extension
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

impl TraceId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Log each request with method, path, status and latency. An incoming
/// `x-trace-id` (or `x-request-id`) header is honored; otherwise a fresh
/// id is generated. The id is echoed back on the response.
pub async fn log_request(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("x-trace-id")
        .or_else(|| request.headers().get("x-request-id"))
        .and_then(|v| v.to_str().ok())
        .map(|s| TraceId(s.to_string()))
        .unwrap_or_else(TraceId::generate);

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    request.extensions_mut().insert(trace_id.clone());

    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed_ms = start.elapsed().as_millis();

    let status = response.status();
    if status.is_server_error() {
        tracing::error!(
            trace_id = %trace_id.0,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            "Request failed"
        );
    } else if status.is_client_error() && status != StatusCode::NOT_FOUND {
        tracing::warn!(
            trace_id = %trace_id.0,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            "Request rejected"
        );
    } else {
        tracing::info!(
            trace_id = %trace_id.0,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            "Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert("x-trace-id", value);
    }

    response
}
