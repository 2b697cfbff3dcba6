//! # Product Gateway - Main Entry Point
//!
//! Starts the HTTP/JSON gateway in front of the product service.
//!
//! ## Startup Order
//!
//! 1. configuration (file from `CONFIG_PATH` or a default location, then `GATEWAY_*` overrides)
//! 2. logging and the metrics recorder
//! 3. backend client (lazy gRPC channel, or the in-memory store)
//! 4. route registry
//! 5. HTTP listener
//!
//! SIGINT or SIGTERM stops the listener from accepting, lets in-flight requests finish,
//! and then drops the server, the registry and the backend client in that order.

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use product_gateway::backend;
use product_gateway::gateway::server::{build_registry, GatewayServer};
use product_gateway::observability::{init_logging, install_prometheus};
use product_gateway::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = GatewayConfig::resolve_path();
    let config = match &config_path {
        Some(path) => GatewayConfig::load_from_file(path)
            .await
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => GatewayConfig::from_env().context("building configuration from defaults")?,
    };

    init_logging(&config.logging).context("initializing logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "🚀 Starting product gateway");
    match &config_path {
        Some(path) => info!(path = %path.display(), "📋 Configuration loaded"),
        None => warn!("No configuration file found, running on defaults and environment"),
    }

    let metrics_handle = install_prometheus(&config.metrics).context("installing metrics recorder")?;

    let backend = backend::from_config(&config.backend).context("creating product backend")?;

    let registry = build_registry(&config, backend, metrics_handle).context("registering routes")?;

    let server = GatewayServer::new(
        registry,
        config.server.socket_addr().context("resolving listen address")?,
    );
    let listener = server.bind().await.context("binding HTTP listener")?;

    info!(
        address = %server.bind_addr(),
        backend = %config.backend.mode,
        "✅ Gateway service started"
    );

    server
        .serve(listener, shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("✅ Gateway service stopped");
    Ok(())
}

/// Resolve on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("📡 Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        _ = terminate => info!("📡 Received SIGTERM, initiating graceful shutdown..."),
    }
}
