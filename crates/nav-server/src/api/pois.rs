//! POI search and waypoint queries.

use crate::api::routes::{bad_request, not_found};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use nav_core::models::GeoPoint;
use nav_core::{geo, visual_scale};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct PoiSearchQuery {
    q: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    alt: f64,
}

/// Search a POI by name and return bearing/elevation for AR sky anchoring.
pub(crate) async fn search_poi(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PoiSearchQuery>,
) -> impl IntoResponse {
    if query.q.trim().is_empty() {
        return bad_request("query parameter 'q' required");
    }
    let observer = GeoPoint::with_altitude(query.lat, query.lon, query.alt);
    let errors = observer.validate();
    if !errors.is_empty() {
        return bad_request(errors.join("; "));
    }

    let Some(poi) = state.waypoints.find_by_name(&query.q) else {
        return not_found(format!(
            "POI '{}' not found. Try a different search.",
            query.q
        ));
    };

    let bearing = geo::bearing(&observer, &poi.location);
    let distance = geo::distance(&observer, &poi.location);
    let elevation = geo::elevation_angle(&observer, &poi.location);

    Json(json!({
        "poi": {
            "id": poi.id,
            "name": poi.name,
            "latitude": poi.location.latitude,
            "longitude": poi.location.longitude,
            "altitude": poi.location.altitude_m,
        },
        "bearing_degrees": round2(bearing),
        "distance_meters": round2(distance),
        "elevation_angle_degrees": round2(elevation),
        "visual_height": round2(visual_scale(distance)),
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbyQuery {
    lat: f64,
    lon: f64,
    #[serde(default = "default_radius")]
    radius: f64,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_radius() -> f64 {
    1000.0
}

fn default_limit() -> usize {
    20
}

/// Waypoints near a location, ascending by distance.
pub(crate) async fn nearby_waypoints(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> impl IntoResponse {
    let center = GeoPoint::new(query.lat, query.lon);
    let errors = center.validate();
    if !errors.is_empty() {
        return bad_request(errors.join("; "));
    }

    let waypoints: Vec<_> = state
        .waypoints
        .nearby(&center, query.radius, query.limit)
        .into_iter()
        .map(|w| {
            let distance = geo::distance(&center, &w.location);
            json!({
                "id": w.id,
                "name": w.name,
                "description": w.description,
                "latitude": w.location.latitude,
                "longitude": w.location.longitude,
                "distance_meters": round2(distance),
            })
        })
        .collect();

    Json(json!({ "waypoints": waypoints })).into_response()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
