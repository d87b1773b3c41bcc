//! Claim checks shared by the JWT and introspection paths.

use authgate_core::{Claims, CredentialType, EngineError, Identity};
use serde_json::Value;

use crate::settings::AudiencePolicy;

/// Token shape of a compact JWS: three non-empty dot-separated segments.
pub fn looks_like_jwt(token: &str) -> bool {
    let mut segments = token.split('.');
    let shaped = (0..3).all(|_| segments.next().is_some_and(|s| !s.is_empty()));
    shaped && segments.next().is_none()
}

/// Scopes from the space-separated `scope` claim, falling back to an `scp`
/// array (or string).
pub fn scopes_from(claims: &Claims) -> Vec<String> {
    match claims.get("scope").or_else(|| claims.get("scp")) {
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Apply subject, issuer and audience rules and build the identity.
pub fn admit(
    claims: Claims,
    issuer: Option<&str>,
    audience: &AudiencePolicy,
    credential_type: CredentialType,
    source: &str,
) -> Result<Identity, EngineError> {
    let subject = claims
        .get("sub")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::Claims("missing sub".into()))?
        .to_string();

    if let Some(expected) = issuer {
        match claims.get("iss").and_then(Value::as_str) {
            Some(iss) if iss == expected => {}
            Some(iss) => return Err(EngineError::Claims(format!("issuer mismatch: {iss}"))),
            None => return Err(EngineError::Claims("missing iss".into())),
        }
    }

    if !audience.accepts(claims.get("aud")) {
        return Err(EngineError::Claims("audience not accepted".into()));
    }

    let scopes = scopes_from(&claims);
    Ok(Identity::new(subject, credential_type, source)
        .with_scopes(scopes)
        .with_claims(claims))
}
