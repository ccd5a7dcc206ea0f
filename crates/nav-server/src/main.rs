//! Navigation server - always-on backend for AR pedestrian navigation.

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nav_server::api;
use nav_server::config::Config;
use nav_server::loops;
use nav_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nav_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting navigation server...");

    let config = Config::from_env();
    let port = config.server_port;
    let state = Arc::new(AppState::new(config));

    if let Some(path) = state.config.waypoint_seed_path.clone() {
        match state.waypoints.load_seed(&path) {
            Ok(count) => tracing::info!("Loaded {count} waypoints from {path}"),
            Err(err) => tracing::warn!("Failed to load waypoint seed {path}: {err}"),
        }
    }

    // Start background loops
    tokio::spawn(loops::cache_prune_loop::run_cache_prune_loop(state.clone()));

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
