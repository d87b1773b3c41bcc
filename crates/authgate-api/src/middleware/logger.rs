//! Request logging: one `info` event per completed request.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use super::request_id::request_id_of;

/// Middleware: log method, path, status, duration and request ID.
///
/// Must run inside [`request_id_middleware`](super::request_id::request_id_middleware)
/// to see the correlation ID.
pub async fn logger_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id_of(request.extensions())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration = ?start.elapsed(),
        request_id = %request_id,
        "request"
    );
    response
}
