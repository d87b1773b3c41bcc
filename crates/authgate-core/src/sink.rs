//! # Observability Sink
//!
//! The gate reports what it decided through an injected [`AuthEventSink`]
//! instead of reaching for a global logger. Production wiring uses
//! [`TracingSink`]; tests use [`MemorySink`] to assert on what was emitted.
//!
//! Events may carry engine error text. That text is for operators only and
//! never reaches the HTTP response.

use parking_lot::Mutex;

use crate::identity::CredentialType;

/// Request coordinates attached to every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Correlation ID, if assigned.
    pub request_id: Option<String>,
}

/// Something the gate observed while evaluating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A configured required header was absent or empty.
    MissingRequiredHeader {
        /// Header name as configured.
        header: String,
    },
    /// No usable `Authorization` header.
    MissingAuthorizationHeader,
    /// `Authorization` did not use the Bearer scheme.
    UnsupportedScheme,
    /// Bearer prefix with nothing after it.
    EmptyToken,
    /// Token handed to the engine.
    Verifying,
    /// Engine refused the token.
    VerificationFailed {
        /// Engine error text, for server-side diagnosis.
        error: String,
    },
    /// Engine accepted the token.
    Verified {
        /// Verified subject.
        subject: String,
        /// Verification path.
        credential_type: CredentialType,
        /// Verifying source.
        source: String,
        /// Granted scopes.
        scopes: Vec<String>,
    },
}

/// Receiver for gate events.
pub trait AuthEventSink: Send + Sync {
    /// Record one event.
    fn record(&self, meta: &EventMeta, event: &AuthEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AuthEventSink for TracingSink {
    fn record(&self, meta: &EventMeta, event: &AuthEvent) {
        let request_id = meta.request_id.as_deref().unwrap_or_default();
        let (method, path) = (meta.method.as_str(), meta.path.as_str());
        match event {
            AuthEvent::MissingRequiredHeader { header } => tracing::warn!(
                header = %header,
                method,
                path,
                request_id,
                "missing required header"
            ),
            AuthEvent::MissingAuthorizationHeader => tracing::warn!(
                method,
                path,
                request_id,
                "missing authorization header"
            ),
            AuthEvent::UnsupportedScheme => tracing::warn!(
                method,
                path,
                request_id,
                "unsupported authorization scheme"
            ),
            AuthEvent::EmptyToken => {
                tracing::warn!(method, path, request_id, "empty bearer token")
            }
            AuthEvent::Verifying => {
                tracing::debug!(method, path, request_id, "verifying token")
            }
            AuthEvent::VerificationFailed { error } => tracing::warn!(
                error = %error,
                method,
                path,
                request_id,
                "token verification failed"
            ),
            AuthEvent::Verified {
                subject,
                credential_type,
                source,
                scopes,
            } => tracing::info!(
                sub = %subject,
                credential_type = %credential_type,
                source = %source,
                scopes = ?scopes,
                method,
                path,
                request_id,
                "token verified"
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(EventMeta, AuthEvent)>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, oldest first.
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Snapshot including request coordinates.
    pub fn entries(&self) -> Vec<(EventMeta, AuthEvent)> {
        self.events.lock().clone()
    }
}

impl AuthEventSink for MemorySink {
    fn record(&self, meta: &EventMeta, event: &AuthEvent) {
        self.events.lock().push((meta.clone(), event.clone()));
    }
}
