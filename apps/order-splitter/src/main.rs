//! Order Splitter Binary
//!
//! Serves the order splitting engine over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-splitter
//! ```
//!
//! # Environment Variables
//!
//! - `SPLITTER_CONFIG`: Path to the YAML config (default: config.yaml, missing file = defaults)
//! - `HTTP_PORT` / `PORT`: HTTP server port (default: 8080)
//! - `RUST_LOG`: Log filter, overrides `observability.logging.level`

use anyhow::Context;
use order_splitter::application::use_cases::SplitGoalsUseCase;
use order_splitter::config::{Config, load_config_or_default};
use order_splitter::infrastructure::http::{AppState, create_app};
use order_splitter::telemetry::init_tracing;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("SPLITTER_CONFIG").ok();
    let config = load_config_or_default(config_path.as_deref())
        .context("failed to load configuration")?
        .with_port_override();

    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;

    tracing::info!("Starting Order Splitter");
    log_config(&config);

    SplitGoalsUseCase::configure_thread_pool(config.engine.max_threads)?;

    let state = AppState::new(
        SplitGoalsUseCase::new(config.engine.min_parallel_goals),
        env!("CARGO_PKG_VERSION"),
    );
    let app = create_app(state, &config.server);

    let addr = config.server.listen_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "HTTP server listening");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  POST /split");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    tracing::info!("Order splitter stopped");
    Ok(())
}

fn log_config(config: &Config) {
    tracing::info!(
        bind_address = %config.server.bind_address,
        http_port = config.server.http_port,
        request_timeout_secs = config.server.request_timeout_secs,
        max_body_bytes = config.server.max_body_bytes,
        min_parallel_goals = config.engine.min_parallel_goals,
        max_threads = config.engine.max_threads,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if the signal handlers cannot be installed, which only happens
/// when the runtime is misconfigured.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
