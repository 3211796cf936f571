/// HTTP server setup using `axum`.
///
/// Provides `ApiContext` (shared state) and `ApiServer` (routing and startup).
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

use super::handlers;
use crate::config::Config;
use crate::model::ModelHolder;

/// Shared application context available to all handlers.
#[derive(Clone)]
pub struct ApiContext {
    pub model: Arc<ModelHolder>,
    pub config: Arc<Config>,
}

/// HTTP server wrapping the context.
#[derive(Clone)]
pub struct ApiServer {
    pub ctx: ApiContext,
}

impl ApiServer {
    pub fn new(ctx: ApiContext) -> Self {
        Self { ctx }
    }

    /// Build the router with all routes and the request trace layer.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/embed", post(handlers::embed))
            .route("/compare", post(handlers::compare))
            .route("/health", get(handlers::health))
            .layer(DefaultBodyLimit::max(self.ctx.config.server.max_body_bytes))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .with_state(self.ctx.clone())
    }

    /// Bind `addr` and serve until Ctrl+C or SIGTERM.
    pub async fn start(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server encountered an error")?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
