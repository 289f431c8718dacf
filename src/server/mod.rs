//! HTTP surface of db-chat.
//!
//! One route answers questions; a second reports liveness. Every request
//! opens its own database connection, so the only shared state is read-only
//! configuration and the factories.

pub mod chat;

pub use chat::{ChatRequest, ChatResponse, ErrorBody, SERVER_ERROR_MESSAGE};

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::AgentFactory;
use crate::config::Config;
use crate::db::DatabaseConnector;
use crate::error::{ChatError, Result};

/// State shared by all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub connector: Arc<dyn DatabaseConnector>,
    pub agents: Arc<dyn AgentFactory>,
}

impl AppState {
    pub fn new(
        config: Config,
        connector: Arc<dyn DatabaseConnector>,
        agents: Arc<dyn AgentFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            agents,
        }
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serves `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ChatError::internal(format!("HTTP server error: {e}")))
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
