use std::net::SocketAddr;

use anyhow::Context;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

mod config;
mod gate_layer;
mod handlers;
mod metrics;
mod state;

use crate::config::EdgeConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = EdgeConfig::load()?;
    let state = AppState::from_config(&config)?;

    let app = router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
        .parse()
        .context("invalid server address/port")?;

    info!(%addr, "edge listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("edge server failure")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/metrics", get(handlers::metrics_snapshot))
        .route("/admin/diagnostics", get(handlers::admin_diagnostics))
        .route("/admin/login", get(handlers::admin_login_page))
        .route("/login", get(handlers::client_login_page))
        .route("/unauthorized", get(handlers::unauthorized_page))
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/history", get(handlers::chat_history))
        .fallback(handlers::page_stub)
        .layer(from_fn_with_state(state.clone(), gate_layer::access_gate))
        .layer(from_fn_with_state(state.clone(), metrics::metrics_middleware))
        .with_state(state)
}

fn init_tracing() {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .finish(),
    )
    .is_err()
    {
        // Subscriber already set by tests or external runtime.
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
