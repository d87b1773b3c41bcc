//! `GET /me`: echo the verified identity back to the caller.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use authgate_core::CredentialType;

use crate::extractors::Authenticated;
use crate::state::AppState;

/// Response body for `/me`. `aud` and `iss` are `null` when the token
/// carried no such claim.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Subject.
    pub sub: String,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Raw `aud` claim.
    pub aud: Option<Value>,
    /// Raw `iss` claim.
    pub iss: Option<Value>,
    /// Verification path.
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// Verifying source.
    pub source: String,
}

/// `/me`. Must be mounted behind the auth gate.
pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn me(Authenticated(ctx): Authenticated) -> Json<MeResponse> {
    let identity = ctx.identity();
    Json(MeResponse {
        sub: identity.subject.clone(),
        scopes: identity.scopes.clone(),
        aud: identity.claim("aud").cloned(),
        iss: identity.claim("iss").cloned(),
        credential_type: identity.credential_type,
        source: identity.source.clone(),
    })
}
