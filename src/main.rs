use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};

use dev_quotes_api::config::LogFormat;
use dev_quotes_api::{AppState, Config, build_router, metrics, telemetry, utils};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration; logging is not configured yet, so fall back to defaults
    let config = Config::from_env().map_err(|e| {
        telemetry::init("info", LogFormat::Pretty);
        error!("{e}");
        exitcode::CONFIG
    })?;

    telemetry::init(&config.log_level, config.log_format);

    info!(
        "Starting Dev Quotes API v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        host = %config.host,
        port = %config.port,
        environment = %config.environment,
        quotes_path = %config.quotes_path.display(),
        reload_quotes = config.reload_quotes,
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    // Load the dataset (or verify the reload source) before accepting traffic
    let state = AppState::from_config(config.clone()).map_err(|e| {
        error!("Failed to load quotes dataset: {e}");
        exitcode::DATAERR
    })?;

    let app = build_router(state).map_err(|e| {
        error!("Failed to build router: {e}");
        exitcode::CONFIG
    })?;

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /v1/health          - Health check");
    info!("  GET  /v1/ready           - Readiness check");
    info!("  GET  /v1/quotes          - List quotes (author, tag, page, per_page)");
    info!("  GET  /v1/quotes/random   - Random quote");
    info!("  GET  /v1/quotes/{{id}}     - Quote by id");

    // Peer addresses feed the rate limiter's client IP fallback
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Server shutdown complete");
    Ok(())
}
