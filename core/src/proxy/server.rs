//! Gateway server - Axum HTTP server around the forwarding handler.

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use tokio::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::proxy::forward::forward_handler;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Backend origin, resolved once at startup. `None` means unconfigured.
    pub upstream_origin: Option<String>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(upstream_origin: Option<String>) -> Self {
        Self {
            upstream_origin,
            http_client: upstream_client(),
        }
    }
}

/// Outbound client for the forwarding path. Redirects from the backend are
/// relayed to the caller, never followed here.
fn upstream_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(20))
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(reqwest::redirect::Policy::none())
        .user_agent("soc-gateway/0.1")
        .build()
        .expect("Failed to create HTTP client")
}

/// Build the gateway router: liveness probe plus the /api catch-all.
///
/// The permissive CORS layer wraps the health routes only. It must not sit
/// on the catch-all: it would answer every OPTIONS preflight itself, and
/// OPTIONS under /api is answered by the forwarding handler.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health = Router::new()
        .route("/healthz", get(health_check_handler))
        .route("/health", get(health_check_handler))
        .layer(cors);

    Router::new()
        .route("/api/*path", any(forward_handler))
        .merge(health)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gateway server instance
pub struct GatewayServer {
    host: String,
    port: u16,
    max_body_bytes: usize,
    state: AppState,
}

impl GatewayServer {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            max_body_bytes: config.limits.max_body_bytes,
            state: AppState::new(config.upstream.origin.clone()),
        }
    }

    /// Run the gateway server (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        let app = router(self.state, self.max_body_bytes);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Gateway listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
