//! PaperLane API Gateway binary
//!
//! Loads configuration, wires the production backends and serves the
//! endpoint surface until Ctrl-C or SIGTERM.

use anyhow::Context;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use paperlane_common::{config::AppConfig, metrics, Backends};
use paperlane_gateway::{create_router, AppState};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting PaperLane API Gateway v{}",
        paperlane_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .set_buckets_for_metric(
                Matcher::Suffix("backend_duration_seconds".to_string()),
                metrics::BACKEND_BUCKETS,
            )?
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(%addr, "Metrics exporter listening");
    }
    metrics::register_metrics();

    // Build backends; a missing secret is fatal
    let backends = Backends::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize backends");
        e
    })?;

    let addr = config.bind_address();
    let app = create_router(AppState::new(config, backends));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins over the configured level
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
