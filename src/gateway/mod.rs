//! Axum-based HTTP gateway over the arbitration pipeline.
//!
//! - Request body size limits (64KB max)
//! - Request timeouts (30s) to prevent slow-loris attacks
//! - CORS restricted to the configured origins

mod handlers;

use handlers::{
    handle_audit, handle_chat, handle_health, handle_mode, handle_root, handle_shutdown,
};

use crate::audit::{AuditTrail, create_audit_sink};
use crate::config::Config;
use crate::session::Orchestrator;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_AUDIT_LIMIT: usize = 10;
pub const MAX_AUDIT_LIMIT: usize = 100;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub audit: AuditTrail,
}

/// `POST /api/mode` body
#[derive(serde::Deserialize)]
pub struct ModeBody {
    pub mode: String,
}

/// `GET /api/audit` query params
#[derive(serde::Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// Returns true when the bind address is not a loopback address.
fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let mut app = Router::new()
        .route("/", get(handle_root))
        .route("/api/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/mode", post(handle_mode))
        .route("/api/shutdown", post(handle_shutdown))
        .route("/api/audit", get(handle_audit))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    if !cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        // Wildcards are not allowed alongside credentials; mirror instead.
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true),
        );
    }

    app
}

/// Run the HTTP gateway on `host:port`.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    // ── Security: refuse public bind without explicit opt-in ──
    if is_public_bind(host) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: the gateway would be exposed to the network.\n\
             Fix: use --host 127.0.0.1 (default), or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(host, listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener until ctrl-c / SIGTERM.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    serve_until(host, listener, config, shutdown_signal()).await
}

/// Serve until `signal` resolves. Writes SYSTEM_STARTUP before accepting
/// connections and SYSTEM_SHUTDOWN after the server drains.
pub async fn serve_until<F>(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Config,
    signal: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let actual_port = listener.local_addr()?.port();

    let audit = AuditTrail::new(create_audit_sink(&config));
    let orchestrator = Arc::new(Orchestrator::from_config(&config, audit.clone())?);

    audit
        .system_startup(env!("CARGO_PKG_VERSION"), orchestrator.gate().mode())
        .await;

    tracing::info!(
        addr = %format!("{host}:{actual_port}"),
        mode = %orchestrator.gate().mode(),
        audit = audit.sink_name(),
        cors = ?config.gateway.cors_origins,
        "gateway listening"
    );

    let state = AppState {
        orchestrator,
        audit: audit.clone(),
    };
    let app = build_app(state, &config.gateway.cors_origins);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;

    tracing::info!("gateway stopped");
    audit.system_shutdown("application_termination").await;

    served.context("gateway server error")
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        () = terminate => tracing::info!("received terminate signal, shutting down"),
    }
}
