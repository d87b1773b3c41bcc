//! # Rejection Taxonomy
//!
//! Closed set of reasons the gate (or a downstream handler) can refuse a
//! request for. Each reason carries a stable machine-readable `code` and
//! belongs to one coarse [`ErrorCategory`], which fixes the HTTP status.
//!
//! Clients match on `code`. Messages are for humans and may change.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Fine-grained rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// A configured required header is absent or empty.
    MissingRequiredHeader,
    /// No `Authorization` header, or an empty one.
    MissingAuthorizationHeader,
    /// Unsupported scheme, empty bearer token, or any engine failure.
    ///
    /// Engine failures are not broken down further: "malformed", "expired"
    /// and "introspection unreachable" all surface as this one code.
    InvalidToken,
    /// Authorization-level denial. No gate policy produces it today.
    Forbidden,
    /// Malformed request other than the header checks. No gate policy
    /// produces it today.
    BadRequest,
}

impl RejectionReason {
    /// Machine-readable code placed in the `code` field of the error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredHeader => "missing_required_header",
            Self::MissingAuthorizationHeader => "missing_authorization_header",
            Self::InvalidToken => "invalid_token",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
        }
    }

    /// Coarse category this reason is reported under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingRequiredHeader | Self::BadRequest => ErrorCategory::BadRequest,
            Self::MissingAuthorizationHeader | Self::InvalidToken => ErrorCategory::Unauthorized,
            Self::Forbidden => ErrorCategory::Forbidden,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Coarse error category, placed in the `error` field of the error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 401.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 400.
    BadRequest,
}

impl ErrorCategory {
    /// Category name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
        }
    }

    /// HTTP status for this category.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reason plus the human-readable detail shown to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Why the request was refused.
    pub reason: RejectionReason,
    /// Client-facing message.
    pub message: String,
}

impl Rejection {
    /// Build a rejection.
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// `missing_required_header` naming the header.
    pub fn missing_required_header(name: &str) -> Self {
        Self::new(
            RejectionReason::MissingRequiredHeader,
            format!("missing required header: {name}"),
        )
    }

    /// `missing_authorization_header`.
    pub fn missing_authorization_header() -> Self {
        Self::new(
            RejectionReason::MissingAuthorizationHeader,
            "missing authorization header",
        )
    }

    /// `invalid_token` for any engine-reported failure. The engine's own
    /// error text never goes into the message.
    pub fn verification_failed() -> Self {
        Self::new(RejectionReason::InvalidToken, "token invalid or expired")
    }

    /// Category of the underlying reason.
    pub fn category(&self) -> ErrorCategory {
        self.reason.category()
    }
}
