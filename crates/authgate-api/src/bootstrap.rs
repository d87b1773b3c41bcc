//! # Bootstrap
//!
//! Turns a validated [`Config`] into a running server.
//!
//! ## Sequence
//!
//! 1. **Build engine**: endpoint URLs, HTTP client. Failure is fatal.
//! 2. **Build gate**: required headers + engine + tracing sink.
//! 3. **Build state**: readiness starts false, flips to true once built.
//! 4. **Serve**: bind `0.0.0.0:<port>`, run until the shutdown future
//!    resolves, then let in-flight requests drain. Accepted connections
//!    close after `server.idle_timeout` without traffic.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use authgate_core::{AuthGate, IdentityEngine};
use authgate_engine::{EngineBuildError, EngineSettings, OAuth2Engine};
use tokio::net::TcpListener;

use crate::config::{AuthConfig, Config, ServerConfig};
use crate::listener::IdleTimeoutListener;
use crate::state::AppState;

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The identity engine could not be constructed.
    #[error("init identity engine: {0}")]
    Engine(#[from] EngineBuildError),

    /// The listen socket could not be bound.
    #[error("bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// I/O error.
        source: std::io::Error,
    },

    /// The server loop failed.
    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
}

/// Typed engine settings for `auth`: URLs parsed, audience policy and
/// verification mode decided.
pub fn engine_settings(auth: &AuthConfig) -> Result<EngineSettings, EngineBuildError> {
    EngineSettings::from_raw(
        &auth.issuer,
        &auth.audience,
        &auth.jwks_url,
        &auth.introspection_url,
        &auth.client_id,
        &auth.client_secret,
    )
}

/// Build the identity engine described by `auth`.
pub fn build_engine(auth: &AuthConfig) -> Result<Arc<dyn IdentityEngine>, BootstrapError> {
    let settings = engine_settings(auth)?;
    Ok(Arc::new(OAuth2Engine::new(settings)?))
}

/// Build ready-to-serve application state.
pub fn build_state(config: &Config) -> Result<AppState, BootstrapError> {
    let engine = build_engine(&config.auth)?;
    let gate = AuthGate::new(config.auth.required_headers.clone(), engine);
    let state = AppState::new(gate)
        .with_request_timeout(config.server.write_timeout)
        .with_read_timeout(config.server.read_timeout);
    state.readiness.mark_ready();

    tracing::info!(
        port = config.server.port,
        auth_issuer = %config.auth.issuer,
        auth_jwks_url = %config.auth.jwks_url,
        auth_introspection_url = %config.auth.introspection_url,
        required_headers = ?config.auth.required_headers.names(),
        "application initialized"
    );
    Ok(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: &Config, state: AppState, shutdown: F) -> Result<(), BootstrapError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| BootstrapError::Bind { addr, source })?;
    tracing::info!(%addr, "starting server");

    serve_on(listener, &config.server, state, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<F>(
    listener: TcpListener,
    server: &ServerConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), BootstrapError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = IdleTimeoutListener::new(listener, server.idle_timeout);
    axum::serve(listener, crate::app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(BootstrapError::Serve)?;

    tracing::info!("server stopped");
    Ok(())
}
