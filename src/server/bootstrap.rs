use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::broadcast::ChannelBroadcaster;
use crate::config::ServiceConfig;
use crate::orchestrator::RoomOrchestrator;
use crate::randomness::RandomnessProvider;

use super::logging::log_requests;
use super::routes::RoomServer;

const LOG_TARGET: &str = "server::bootstrap";

/// Wires the randomness provider, broadcaster, and orchestrator together and
/// serves the API until ctrl-c.
pub async fn run_server(config: ServiceConfig) -> Result<()> {
    let seeds = Arc::new(RandomnessProvider::new(&config.chain));
    let broadcaster = Arc::new(ChannelBroadcaster::new(config.broadcast_capacity));
    let orchestrator = Arc::new(RoomOrchestrator::new(seeds, broadcaster.clone()));

    // Cancelled on shutdown so open event streams terminate promptly.
    let shutdown = CancellationToken::new();

    let router = RoomServer::new(orchestrator, broadcaster, shutdown.clone())
        .into_router()
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_requests))
                .layer(CorsLayer::permissive()),
        );

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(target = LOG_TARGET, %local_addr, "room server listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server exited with error")
}

async fn shutdown_signal(stop: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = LOG_TARGET, error = %err, "failed to install ctrl-c handler");
    }
    info!(target = LOG_TARGET, "shutdown signal received");
    stop.cancel();
}
