//! # Auth Gate
//!
//! Admission control for protected routes. For each request the gate runs a
//! fixed sequence of checks and stops at the first one that fails:
//!
//! 1. every required header, in configured order, is present and non-empty
//! 2. an `Authorization` header is present and non-empty
//! 3. it uses the exact `Bearer ` scheme prefix
//! 4. the token after the prefix is non-empty
//! 5. the identity engine accepts the token
//!
//! Passing all five yields [`Outcome::Admit`] with the verified identity.
//! Any failure yields [`Outcome::Reject`]; the caller renders it and halts
//! the request. There are no retries: a transient engine failure is an
//! `invalid_token` rejection like any other.
//!
//! The gate holds only read-only state (header set, engine handle, sink)
//! and is shared across all in-flight requests without locking.

use std::fmt;
use std::sync::Arc;

use http::request::Parts;
use tokio_util::sync::CancellationToken;

use crate::context::{AuthenticatedContext, RequestContext};
use crate::credential::{authorization_header, BearerCredential, CredentialError, RequiredHeaderSet};
use crate::engine::{until_cancelled, IdentityEngine};
use crate::identity::Identity;
use crate::rejection::{Rejection, RejectionReason};
use crate::sink::{AuthEvent, AuthEventSink, EventMeta, TracingSink};

/// Result of evaluating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// All checks passed.
    Admit(Identity),
    /// A check failed; the request must not proceed.
    Reject(Rejection),
}

impl Outcome {
    /// Whether the request was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit(_))
    }
}

/// The authentication gate.
#[derive(Clone)]
pub struct AuthGate {
    required_headers: RequiredHeaderSet,
    engine: Arc<dyn IdentityEngine>,
    sink: Arc<dyn AuthEventSink>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("required_headers", &self.required_headers)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    /// Build a gate that reports through [`TracingSink`].
    pub fn new(required_headers: RequiredHeaderSet, engine: Arc<dyn IdentityEngine>) -> Self {
        Self {
            required_headers,
            engine,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the observability sink.
    pub fn with_sink(mut self, sink: Arc<dyn AuthEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Configured required headers.
    pub fn required_headers(&self) -> &RequiredHeaderSet {
        &self.required_headers
    }

    /// Evaluate one request.
    ///
    /// `cancel` is forwarded to the engine; if it fires mid-verification the
    /// engine call is abandoned and the request is rejected as `invalid_token`.
    pub async fn evaluate(
        &self,
        parts: &Parts,
        ctx: &RequestContext,
        cancel: &CancellationToken,
    ) -> Outcome {
        let meta = EventMeta {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            request_id: ctx.request_id().map(str::to_string),
        };

        match self.check_preconditions(parts, &meta) {
            Ok(credential) => self.verify(&credential, &meta, cancel).await,
            Err(rejection) => Outcome::Reject(rejection),
        }
    }

    /// Evaluate one request and, on admission, return the augmented context.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when any check fails.
    pub async fn authenticate(
        &self,
        parts: &Parts,
        ctx: RequestContext,
        cancel: &CancellationToken,
    ) -> Result<AuthenticatedContext, Rejection> {
        match self.evaluate(parts, &ctx, cancel).await {
            Outcome::Admit(identity) => Ok(ctx.admit(identity)),
            Outcome::Reject(rejection) => Err(rejection),
        }
    }

    /// Steps 1-4: everything that can be decided from headers alone.
    fn check_preconditions(
        &self,
        parts: &Parts,
        meta: &EventMeta,
    ) -> Result<BearerCredential, Rejection> {
        if let Some(name) = self.required_headers.first_missing(&parts.headers) {
            self.sink.record(
                meta,
                &AuthEvent::MissingRequiredHeader {
                    header: name.to_string(),
                },
            );
            return Err(Rejection::missing_required_header(name));
        }

        let Some(value) = authorization_header(&parts.headers) else {
            self.sink.record(meta, &AuthEvent::MissingAuthorizationHeader);
            return Err(Rejection::missing_authorization_header());
        };

        BearerCredential::extract(value).map_err(|err| {
            let event = match err {
                CredentialError::UnsupportedScheme => AuthEvent::UnsupportedScheme,
                CredentialError::EmptyToken => AuthEvent::EmptyToken,
            };
            self.sink.record(meta, &event);
            Rejection::new(RejectionReason::InvalidToken, err.to_string())
        })
    }

    /// Steps 5-6: hand the token to the engine.
    async fn verify(
        &self,
        credential: &BearerCredential,
        meta: &EventMeta,
        cancel: &CancellationToken,
    ) -> Outcome {
        self.sink.record(meta, &AuthEvent::Verifying);

        let result = until_cancelled(cancel, self.engine.verify(credential.as_str(), cancel)).await;

        match result {
            Ok(identity) => {
                self.sink.record(
                    meta,
                    &AuthEvent::Verified {
                        subject: identity.subject.clone(),
                        credential_type: identity.credential_type,
                        source: identity.source.clone(),
                        scopes: identity.scopes.clone(),
                    },
                );
                Outcome::Admit(identity)
            }
            Err(err) => {
                self.sink.record(
                    meta,
                    &AuthEvent::VerificationFailed {
                        error: err.to_string(),
                    },
                );
                Outcome::Reject(Rejection::verification_failed())
            }
        }
    }
}
