//! REST API routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::{frames, pois};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/analyze-frame", post(frames::analyze_frame))
        .route("/v1/analyze-horizon", post(frames::analyze_horizon))
        .route("/v1/turn-guidance", post(frames::turn_guidance))
        .route("/v1/route-preview", post(frames::route_preview))
        .route("/v1/poi/search", get(pois::search_poi))
        .route("/v1/waypoints/nearby", get(pois::nearby_waypoints))
        .route("/v1/metrics", get(metrics_summary))
}

async fn metrics_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.summary())
}

pub(crate) fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}

pub(crate) fn not_found(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}
