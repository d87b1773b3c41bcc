//! # Verified Identity
//!
//! The value an [`IdentityEngine`](crate::IdentityEngine) produces for a
//! token it accepts. An `Identity` lives for exactly one request: it is
//! created per verification call, attached to that request's context, and
//! dropped with it. Nothing in this crate caches identities across requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended claim set carried by an identity (`aud`, `iss`, `exp`, ...).
pub type Claims = Map<String, Value>;

/// Which verification path produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    /// A structured, signed token validated locally (JWT against a JWKS).
    Jwt,
    /// An opaque token validated by a remote introspection call.
    Opaque,
}

impl CredentialType {
    /// Return the string representation of this credential type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jwt => "jwt",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified principal.
///
/// `subject` is never empty for an identity returned on the success path;
/// engines must treat a token without a subject as a verification failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Principal identifier (`sub`).
    pub subject: String,
    /// Granted scopes, in the order the engine reported them.
    pub scopes: Vec<String>,
    /// Every claim the engine saw for this token.
    pub claims: Claims,
    /// Verification path taken.
    pub credential_type: CredentialType,
    /// Free-form description of the verifying source, for audit correlation.
    pub source: String,
}

impl Identity {
    /// Build an identity with no scopes and no claims.
    pub fn new(
        subject: impl Into<String>,
        credential_type: CredentialType,
        source: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            scopes: Vec::new(),
            claims: Claims::new(),
            credential_type,
            source: source.into(),
        }
    }

    /// Replace the scope list.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the claim set.
    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.claims = claims;
        self
    }

    /// Look up a single claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Whether `scope` was granted.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
