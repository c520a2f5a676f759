//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use screentask_planner::TaskPipeline;

use crate::auth::Authenticator;
use crate::{health_api, routes};

/// Application state shared across routes.
pub struct GatewayState {
    pub pipeline: Arc<TaskPipeline>,
    pub authenticator: Arc<dyn Authenticator>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(pipeline: Arc<TaskPipeline>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            pipeline,
            authenticator,
            started_at: Instant::now(),
        }
    }
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/health", get(health_api::get_health))
        .route("/api/user-outputs", get(routes::user_outputs))
        .route("/api/user-screenshots", get(routes::user_screenshots))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API on an already-bound listener until shutdown.
pub async fn serve(listener: TcpListener, state: Arc<GatewayState>) -> Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Starts the main Axum HTTP server for the gateway.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: Arc<GatewayState>) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", addr);
    serve(listener, state).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
