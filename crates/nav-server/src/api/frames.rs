//! Frame, horizon, guidance, and route-preview handlers.
//!
//! Handlers are thin: request shape validation plus status mapping. All
//! pipeline logic lives below this layer.

use crate::api::routes::bad_request;
use crate::guidance::{self, TurnGuidanceRequest};
use crate::horizon::{self, HorizonRequest};
use crate::pipeline::{self, FrameRequest};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use nav_core::models::{GeoPoint, Waypoint};
use nav_core::PipelineError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) async fn analyze_frame(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FrameRequest>,
) -> impl IntoResponse {
    match pipeline::analyze_frame(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(PipelineError::Validation(message)) => bad_request(message),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn analyze_horizon(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HorizonRequest>,
) -> impl IntoResponse {
    match horizon::analyze_horizon(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(PipelineError::Validation(message)) => bad_request(message),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn turn_guidance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TurnGuidanceRequest>,
) -> impl IntoResponse {
    match guidance::turn_guidance(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(PipelineError::Validation(message)) => bad_request(message),
        Err(other) => internal_error(other),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoutePreviewWaypoint {
    name: String,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon")]
    longitude: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoutePreviewRequest {
    latitude: f64,
    longitude: f64,
    waypoints: Vec<RoutePreviewWaypoint>,
}

pub(crate) async fn route_preview(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoutePreviewRequest>,
) -> impl IntoResponse {
    let location = GeoPoint::new(request.latitude, request.longitude);
    let waypoints: Vec<Waypoint> = request
        .waypoints
        .into_iter()
        .map(|w| Waypoint {
            id: Uuid::new_v4().to_string(),
            name: w.name,
            location: GeoPoint::new(w.latitude, w.longitude),
            description: String::new(),
            created_at: Utc::now(),
        })
        .collect();

    match pipeline::route_preview(&state, location, &waypoints).await {
        Ok(cues) => Json(json!({ "cues": cues })).into_response(),
        Err(PipelineError::Validation(message)) => bad_request(message),
        Err(PipelineError::UpstreamUnavailable(message)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": message })),
        )
            .into_response(),
        Err(other) => internal_error(other),
    }
}

fn internal_error(err: PipelineError) -> axum::response::Response {
    tracing::error!("unexpected pipeline error: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}
