//! # Application State
//!
//! Shared state handed to middleware and handlers through axum's `State`
//! extractor. Everything here is cheap to clone and read-only except the
//! readiness flag, which flips once at startup and once at shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use authgate_core::AuthGate;
use tokio_util::sync::CancellationToken;

/// Readiness flag reported by `/readyz`.
#[derive(Debug, Clone, Default)]
pub struct Readiness(Arc<AtomicBool>);

impl Readiness {
    /// A flag starting in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the process should receive traffic.
    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Start accepting traffic.
    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Stop accepting traffic.
    pub fn mark_not_ready(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Application state shared by all requests.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Authentication gate for protected routes.
    pub gate: Arc<AuthGate>,
    /// Readiness flag.
    pub readiness: Readiness,
    /// Process-wide cancellation; every request's verification token is a
    /// child of this one.
    pub shutdown: CancellationToken,
    /// Per-request time limit applied by the timeout layer.
    pub request_timeout: Duration,
    /// Longest a request body read may stall.
    pub read_timeout: Duration,
}

impl AppState {
    /// State around `gate`, not yet ready, with 10 second request and
    /// body-read limits.
    pub fn new(gate: AuthGate) -> Self {
        Self {
            gate: Arc::new(gate),
            readiness: Readiness::new(),
            shutdown: CancellationToken::new(),
            request_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
        }
    }

    /// Override the per-request time limit.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the body-read stall limit.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
