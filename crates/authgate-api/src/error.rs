//! # API Error Type
//!
//! Wraps the canonical `(StatusCode, ErrorResponse)` pair so it can be
//! returned from handlers and middleware as an axum response. All refusals
//! the gateway emits, gate rejections and handler errors alike, render
//! through here and share one JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use authgate_core::{respond, respond_to, ErrorCategory, ErrorResponse, Rejection, RejectionReason};

/// HTTP error carrying the canonical JSON body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {} ({})", .body.message, .body.code)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Build from explicit parts.
    pub fn new(
        category: ErrorCategory,
        reason: RejectionReason,
        message: impl Into<String>,
        request_id: Option<&str>,
    ) -> Self {
        let (status, body) = respond(category, reason, message, request_id);
        Self { status, body }
    }

    /// Render a gate rejection.
    pub fn from_rejection(rejection: &Rejection, request_id: Option<&str>) -> Self {
        let (status, body) = respond_to(rejection, request_id);
        Self { status, body }
    }

    /// 401 for a handler that expected an authenticated context and found none.
    pub fn unauthenticated(request_id: Option<&str>) -> Self {
        Self::new(
            ErrorCategory::Unauthorized,
            RejectionReason::InvalidToken,
            "no verified identity on request",
            request_id,
        )
    }

    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// JSON body.
    pub fn body(&self) -> &ErrorResponse {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
