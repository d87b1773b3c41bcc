//! # authgate — Binary Entry Point
//!
//! Loads configuration, builds the identity engine and serves the gateway
//! until SIGINT or SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use authgate_api::{bootstrap, config, shutdown};

/// Bearer-token authentication gateway.
#[derive(Debug, Parser)]
#[command(name = "authgate", version, about)]
struct Cli {
    /// Configuration file. Falls back to $CONFIG_PATH, then ./config.yml.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = config::resolve_path(cli.config.as_deref());
    let config = match config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(config::LogLevel::Info, cli.json_logs);
            tracing::error!(error = %e, "failed to load config");
            return Err(e.into());
        }
    };

    init_tracing(config.server.log_level, cli.json_logs);
    tracing::debug!(config_path = %path.display(), ?config, "configuration resolved");

    let state = bootstrap::build_state(&config).map_err(|e| {
        tracing::error!(error = %e, "failed to initialize application");
        e
    })?;

    bootstrap::serve(&config, state.clone(), shutdown::on_signal(state))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "server error");
            e
        })?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level.
fn init_tracing(level: config::LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
