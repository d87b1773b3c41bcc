//! # Identity Engine Contract
//!
//! The gate hands every extracted bearer token to an [`IdentityEngine`] and
//! trusts its answer. How the engine decides (signature checks, key
//! fetching, remote introspection) is its own business; the gate only needs
//! `verify(token, cancel) -> Identity | EngineError`.
//!
//! Engines may perform network I/O. They receive the request's
//! [`CancellationToken`] and must return promptly once it fires.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::identity::Identity;

/// Verification failure reported by an engine.
///
/// The variants exist for server-side logs. The gate collapses all of them
/// into a single client-visible `invalid_token` rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The token is malformed, badly signed, expired, or otherwise invalid.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token was well-formed but carries unacceptable claims
    /// (issuer, audience, missing subject).
    #[error("claims rejected: {0}")]
    Claims(String),

    /// A remote dependency (JWKS endpoint, introspection endpoint) failed.
    #[error("upstream failure calling {endpoint}: {reason}")]
    Upstream {
        /// Which upstream was being called.
        endpoint: String,
        /// What went wrong.
        reason: String,
    },

    /// The engine is not configured for this kind of token.
    #[error("no verifier configured: {0}")]
    NotConfigured(String),

    /// The caller's cancellation token fired before verification finished.
    #[error("verification cancelled")]
    Cancelled,
}

/// Verifies bearer tokens.
///
/// Implementations must be `Send + Sync` so one engine can be shared across
/// every in-flight request behind an `Arc`. The engine is read-only from
/// the gate's point of view; the gate never reconfigures it.
#[async_trait]
pub trait IdentityEngine: Send + Sync {
    /// Verify `token` (without the `Bearer ` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for any verification failure, including
    /// [`EngineError::Cancelled`] when `cancel` fires first.
    async fn verify(&self, token: &str, cancel: &CancellationToken)
        -> Result<Identity, EngineError>;
}

/// Race `fut` against `cancel`, returning [`EngineError::Cancelled`] if the
/// token fires first. The losing future is dropped.
pub async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, EngineError>
where
    F: std::future::Future<Output = Result<T, EngineError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(EngineError::Cancelled),
        result = fut => result,
    }
}
