//! # Extractors
//!
//! [`Authenticated`] pulls the [`AuthenticatedContext`] the gate adapter
//! stored in request extensions. A handler using it on a route that is not
//! behind the gate answers 401 instead of panicking.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use authgate_core::AuthenticatedContext;

use crate::error::ApiError;
use crate::middleware::request_id_of;

/// The verified caller of a protected route.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthenticatedContext);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedContext>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ApiError::unauthenticated(request_id_of(&parts.extensions)))
    }
}
