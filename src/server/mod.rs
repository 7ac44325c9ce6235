//! HTTP service layer
//!
//! Thin façade over the core: routing, typed request/response bodies, and
//! error mapping. All retrieval and storage semantics live below this
//! module.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::app::AppContext;
use crate::error::{RagError, Result};

pub mod handlers;

/// Build the application router
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/add_job", post(handlers::add_job))
        .route("/search_jobs", post(handlers::search_jobs))
        .route("/chat", post(handlers::chat))
        .route("/chat_history/{user_id}", get(handlers::chat_history))
        .with_state(ctx)
}

/// Bind and serve until ctrl-c
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = ctx.config.server.bind.clone();
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| RagError::Config(format!("invalid bind address {bind}")))?;

    let app = router(ctx);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "jobrag listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
