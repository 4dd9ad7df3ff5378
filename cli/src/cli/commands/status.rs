use std::path::PathBuf;
use std::sync::Arc;

use soc_gateway_core::client::{ApiClient, StaticTokenProvider};
use soc_gateway_core::config::{default_config_path, load_config};

pub async fn run(config_path: Option<PathBuf>, url_override: Option<String>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let base_url = url_override
        .unwrap_or_else(|| format!("http://{}:{}", config.server.host, config.server.port));

    println!("SOC Gateway Status");
    println!("==================");
    println!();
    println!("Configuration:");
    println!("  Config file: {:?}", default_config_path());
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    match &config.upstream.origin {
        Some(origin) => println!("  Upstream: {}", origin),
        None => println!("  Upstream: not configured"),
    }
    println!();

    // Probe the running gateway through the shared API client
    let client = ApiClient::new(&base_url, Arc::new(StaticTokenProvider(None)));
    match client.get("/healthz").await {
        Ok(body) => {
            println!("Gateway: RUNNING ✓");
            if let Some(body) = body {
                println!("  Reply: {}", body);
            }
        }
        Err(e) => {
            println!("Gateway: NOT RUNNING ({} error: {})", e.kind, e.message);
        }
    }

    Ok(())
}
