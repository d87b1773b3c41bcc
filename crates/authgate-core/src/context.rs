//! # Request Context
//!
//! Typed per-request state handed from one pipeline stage to the next.
//! The request-ID stage produces a [`RequestContext`]; the gate consumes it
//! and, on admission, returns an [`AuthenticatedContext`] that adds the
//! verified identity. Handlers read exactly the fields they need without
//! casting out of an untyped bag.

use std::sync::Arc;

use crate::identity::{Claims, CredentialType, Identity};

/// State known about a request before authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Option<String>,
}

impl RequestContext {
    /// Context with a correlation ID.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }

    /// Context with no correlation ID.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The correlation ID, if one was assigned.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Augment this context with a verified identity.
    pub fn admit(self, identity: Identity) -> AuthenticatedContext {
        AuthenticatedContext {
            request: self,
            identity: Arc::new(identity),
        }
    }
}

/// State known about a request after the gate admitted it.
///
/// Cloning is cheap; the identity is shared, never copied.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedContext {
    request: RequestContext,
    identity: Arc<Identity>,
}

impl AuthenticatedContext {
    /// The correlation ID, if one was assigned.
    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id()
    }

    /// The full verified identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Verified subject.
    pub fn subject(&self) -> &str {
        &self.identity.subject
    }

    /// Granted scopes.
    pub fn scopes(&self) -> &[String] {
        &self.identity.scopes
    }

    /// All claims.
    pub fn claims(&self) -> &Claims {
        &self.identity.claims
    }

    /// Verification path taken.
    pub fn credential_type(&self) -> CredentialType {
        self.identity.credential_type
    }
}
