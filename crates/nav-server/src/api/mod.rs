//! API routes for the navigation server.

pub mod frames;
pub mod pois;
mod routes;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}
