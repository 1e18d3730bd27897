use super::cors::cors_middleware;
use super::handlers::{
    handle_chat, handle_health, handle_method_not_allowed, handle_not_found,
};
use super::{AppState, MAX_BODY_SIZE, REQUEST_TIMEOUT_SECS};

use crate::config::GatewayConfig;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Returns true when the bind address is not a loopback address.
pub fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run_gateway(gateway: &GatewayConfig, state: AppState) -> Result<()> {
    let host = gateway.host.as_str();
    if is_public_bind(host) && !gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: the gateway would be exposed to the network.\n\
             Fix: use --host 127.0.0.1 (default) or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let addr: SocketAddr = format!("{host}:{}", gateway.port)
        .parse()
        .or_else(|_| {
            // `localhost` is not a socket literal.
            format!("127.0.0.1:{}", gateway.port).parse()
        })
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Serve on a pre-bound listener until `shutdown` resolves.
pub async fn run_gateway_with_listener<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let local = listener
        .local_addr()
        .context("get gateway listener local address")?;
    tracing::info!(addr = %local, "gateway listening (POST /api/chat, GET /health)");

    let app = build_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serve HTTP gateway")?;

    Ok(())
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/chat",
            post(handle_chat).fallback(handle_method_not_allowed),
        )
        .route(
            "/health",
            get(handle_health).fallback(handle_method_not_allowed),
        )
        .fallback(handle_not_found)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(middleware::from_fn(cors_middleware))
}
