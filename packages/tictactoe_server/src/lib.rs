//! Authoritative tic-tac-toe server.
//!
//! Clients connect to `/ws` and are paired in arrival order. Each session is
//! owned by its own actor task, so moves within a session are serialized
//! while sessions run independently.

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::info;
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod session_actor;
pub mod ws;

use crate::config::ServerConfig;
use crate::metrics::ServerMetrics;
use crate::registry::GameRegistry;
use crate::session_actor::SessionOptions;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<GameRegistry>,
    /// Server metrics for observability
    pub metrics: Arc<ServerMetrics>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let metrics = Arc::new(ServerMetrics::new());
        let registry = Arc::new(GameRegistry::new(
            SessionOptions::from_config(&config),
            metrics.clone(),
        ));
        Self {
            registry,
            metrics,
            config: Arc::new(config),
        }
    }
}

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(handlers::game_websocket_handler))
        .route("/sessions", get(handlers::list_sessions_handler))
        // Health endpoints
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves. Live sessions are told the server is
/// going away before the listener stops.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = state.registry.clone();
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Received shutdown signal, closing sessions...");
            registry.shutdown().await;
        })
        .await
        .context("Server error")
}
