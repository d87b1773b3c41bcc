//! Engine construction errors.
//!
//! Verification failures use [`authgate_core::EngineError`]; this type only
//! covers what can go wrong while building an engine at startup.

/// Errors raised while constructing an [`OAuth2Engine`](crate::OAuth2Engine).
#[derive(Debug, thiserror::Error)]
pub enum EngineBuildError {
    /// A configured endpoint is not a valid absolute URL.
    #[error("invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Configuration field holding the URL.
        field: &'static str,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be created.
    #[error("HTTP client initialisation failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}
