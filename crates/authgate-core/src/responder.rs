//! # Error Responder
//!
//! Pure mapping from a rejection to an HTTP status and the canonical JSON
//! error body. Every refusal the gateway emits, from the gate or from a
//! handler, goes through here so clients see one shape:
//!
//! ```json
//! {"error":"unauthorized","code":"invalid_token","message":"token invalid or expired","request_id":"..."}
//! ```
//!
//! `request_id` is omitted entirely when no correlation value is known; it
//! is never serialized as an empty string.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::rejection::{ErrorCategory, Rejection, RejectionReason};

/// Wire-level error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Coarse category (`unauthorized`, `forbidden`, `bad_request`).
    pub error: String,
    /// Fine-grained rejection code.
    pub code: String,
    /// Human-readable message, not guaranteed stable.
    pub message: String,
    /// Correlation identifier for the request, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Build an error body from its parts.
    ///
    /// An empty `request_id` is treated as absent.
    pub fn new(
        category: ErrorCategory,
        reason: RejectionReason,
        message: impl Into<String>,
        request_id: Option<&str>,
    ) -> Self {
        Self {
            error: category.as_str().to_string(),
            code: reason.code().to_string(),
            message: message.into(),
            request_id: request_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }

    /// Build the error body for a gate rejection.
    pub fn from_rejection(rejection: &Rejection, request_id: Option<&str>) -> Self {
        Self::new(
            rejection.category(),
            rejection.reason,
            rejection.message.clone(),
            request_id,
        )
    }
}

/// Map `(category, reason, message)` plus the ambient correlation value to a
/// status and body.
pub fn respond(
    category: ErrorCategory,
    reason: RejectionReason,
    message: impl Into<String>,
    request_id: Option<&str>,
) -> (StatusCode, ErrorResponse) {
    (
        category.status(),
        ErrorResponse::new(category, reason, message, request_id),
    )
}

/// [`respond`] for a gate rejection.
pub fn respond_to(rejection: &Rejection, request_id: Option<&str>) -> (StatusCode, ErrorResponse) {
    (
        rejection.category().status(),
        ErrorResponse::from_rejection(rejection, request_id),
    )
}
