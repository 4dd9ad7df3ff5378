use std::path::PathBuf;

use soc_gateway_core::config::load_config;
use soc_gateway_core::proxy::GatewayServer;

pub async fn run(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(config_path)?;

    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting SOC gateway...");
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Port: {}", config.server.port);
    match &config.upstream.origin {
        Some(origin) => tracing::info!("  Upstream: {}", origin),
        None => tracing::warn!("  Upstream: not configured; forwarded requests will return 500"),
    }

    let server = GatewayServer::new(&config);

    tracing::info!(
        "Gateway starting on http://{}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
