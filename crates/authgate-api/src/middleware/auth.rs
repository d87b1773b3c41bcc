//! # Auth Gate Adapter
//!
//! Runs [`AuthGate`](authgate_core::AuthGate) in front of protected routes.
//! On admission the [`AuthenticatedContext`] is inserted into request
//! extensions for handlers; on rejection the request stops here and the
//! canonical error body is returned.
//!
//! Each request verifies under a child of the process shutdown token. The
//! child is cancelled when this future is dropped (client went away,
//! request timeout fired) so in-flight engine calls are abandoned too.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use authgate_core::{AuthenticatedContext, RequestContext};

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware: authenticate the request or reject it.
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let ctx = parts
        .extensions
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();

    let cancel = state.shutdown.child_token();
    let _abandon_on_drop = cancel.clone().drop_guard();

    match state.gate.authenticate(&parts, ctx.clone(), &cancel).await {
        Ok(authenticated) => {
            parts.extensions.insert::<AuthenticatedContext>(authenticated);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(rejection) => ApiError::from_rejection(&rejection, ctx.request_id()).into_response(),
    }
}
