//! # Request ID
//!
//! Assigns every request a correlation ID. An incoming non-empty
//! `X-Request-Id` is kept; otherwise a UUID v4 is generated. The value is
//! stored as a typed [`RequestContext`] in request extensions and echoed on
//! the response.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use authgate_core::RequestContext;

/// Correlation header name.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Middleware: attach a [`RequestContext`] and echo `X-Request-Id`.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestContext::new(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

/// Correlation ID previously attached by [`request_id_middleware`].
pub fn request_id_of(extensions: &http::Extensions) -> Option<&str> {
    extensions
        .get::<RequestContext>()
        .and_then(RequestContext::request_id)
}
