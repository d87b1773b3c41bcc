//! Graceful shutdown on SIGINT / SIGTERM.

use crate::state::AppState;

/// Resolve on the first SIGINT or SIGTERM, after marking the process
/// not-ready and cancelling every in-flight verification.
pub async fn on_signal(state: AppState) {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "shutting down");
    begin(&state);
}

/// Stop admitting traffic and abort outstanding engine calls.
pub fn begin(state: &AppState) {
    state.readiness.mark_not_ready();
    state.shutdown.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for SIGINT only");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
