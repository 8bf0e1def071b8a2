//! HTTP surface: the streaming chat route plus health and tool listing.

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;

pub use auth::TokenAuthenticator;
pub use error::ApiError;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::agent_loop::AgentEngine;
use crate::error::{Result, ThreadlineError};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AgentEngine>,
    pub auth: Arc<TokenAuthenticator>,
}

impl AppState {
    pub fn new(engine: Arc<AgentEngine>, auth: TokenAuthenticator) -> Self {
        Self {
            engine,
            auth: Arc::new(auth),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/tools", get(routes::list_tools))
        .route("/api/chat/stream", post(routes::chat_stream))
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ThreadlineError::Configuration(format!("cannot bind {addr}: {e}")))?;
    info!(addr = %listener.local_addr()?, "threadline server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("threadline server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
