//! # authgate-api — HTTP Surface for the Bearer-Token Gateway
//!
//! Wires the [`authgate_core::AuthGate`] into an axum router together with
//! configuration loading, correlation IDs, request logging, health checks
//! and process lifecycle.
//!
//! ## API Surface
//!
//! | Path | Module | Auth |
//! |---|---|---|
//! | `GET /healthz` | [`routes::health`] | public |
//! | `GET /readyz` | [`routes::health`] | public |
//! | `GET /me` | [`routes::me`] | bearer token |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! RequestId → Logger → Timeout → BodyTimeout → [AuthGate → ] Handler
//! ```
//!
//! `Timeout` answers `408` with an empty body once `server.write_timeout`
//! elapses. `BodyTimeout` fails body reads that stall past
//! `server.read_timeout`. The idle limit lives on the connection, see
//! [`listener`].

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod listener;
pub mod middleware;
pub mod routes;
pub mod shutdown;
pub mod state;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

use crate::state::AppState;

/// Assemble the full application router.
///
/// Health checks are mounted outside the auth gate so they stay reachable
/// without credentials. Unknown paths are not gated either.
pub fn app(state: AppState) -> Router {
    let protected = routes::me::router().route_layer(from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    let router = Router::new()
        .merge(routes::health::router())
        .merge(protected);
    let router = with_time_limits(router, &state)
        .layer(from_fn(middleware::logger_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .with_state(state);

    tracing::info!(
        middleware = ?["RequestId", "Logger", "Timeout", "BodyTimeout"],
        public = ?["/healthz", "/readyz"],
        protected = ?["/me"],
        "routes registered"
    );
    router
}

/// Per-request limits: whole-request deadline and stalled-body cutoff.
fn with_time_limits(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router
        .layer(RequestBodyTimeoutLayer::new(state.read_timeout))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.request_timeout,
        ))
}
