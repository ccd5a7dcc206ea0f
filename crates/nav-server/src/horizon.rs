//! Terrain-gated skyline refinement for distant POI markers.
//!
//! Failure mode is always "render with un-refined positions", never
//! "render nothing": the input POI list comes back unmodified with an
//! error indicator whenever analysis cannot run.

use crate::imaging;
use crate::state::AppState;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use nav_core::models::{
    normalize_heading, AnalysisContext, GeoPoint, ReasoningToken, RefinedPoi, SkylineFeature,
    VisiblePoi,
};
use nav_core::PipelineError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonRequest {
    pub image: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub visible_pois: Vec<VisiblePoi>,
    #[serde(default)]
    pub reasoning_token: Option<ReasoningToken>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HorizonResponse {
    pub horizon_line_y_percent: f64,
    pub skyline_features: Vec<SkylineFeature>,
    pub refined_pois: Vec<RefinedPoi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_token: Option<ReasoningToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pass-through response: every POI shown exactly where geometry put it.
pub fn passthrough(
    visible_pois: &[VisiblePoi],
    skipped_reason: Option<String>,
    error: Option<String>,
) -> HorizonResponse {
    HorizonResponse {
        horizon_line_y_percent: 50.0,
        skyline_features: Vec::new(),
        refined_pois: visible_pois.iter().map(RefinedPoi::unrefined).collect(),
        reasoning_token: None,
        skipped_reason,
        error,
    }
}

/// Refine POI marker placement against the detected skyline.
pub async fn analyze_horizon(
    state: &AppState,
    req: HorizonRequest,
) -> Result<HorizonResponse, PipelineError> {
    let location = GeoPoint::new(req.latitude, req.longitude);
    let errors = location.validate();
    if !errors.is_empty() {
        return Err(PipelineError::Validation(errors.join("; ")));
    }
    if !req.heading.is_finite() {
        return Err(PipelineError::Validation("heading must be finite".to_string()));
    }
    let heading = normalize_heading(req.heading);

    // Flat terrain: nothing can occlude the markers, skip the model call.
    let (skip, reason) = state
        .terrain
        .should_skip_analysis(&location, state.config.terrain_gate_radius_m)
        .await;
    if skip {
        tracing::debug!("skipping horizon analysis: {reason}");
        return Ok(passthrough(&req.visible_pois, Some(reason), None));
    }

    let Some(client) = &state.vision else {
        state
            .metrics
            .record_ai_error("not_configured", "vision client not configured");
        return Ok(passthrough(
            &req.visible_pois,
            None,
            Some("vision client not configured".to_string()),
        ));
    };

    let image = match decode_image(&req.image) {
        Ok(bytes) => bytes,
        Err(message) => {
            state.metrics.record_ai_error("image_decode", &message);
            return Ok(passthrough(&req.visible_pois, None, Some(message)));
        }
    };

    let (jpeg, stats) = imaging::compress_jpeg(&image);
    if let Some(stats) = stats {
        state
            .metrics
            .record_compression(stats.original_bytes, stats.compressed_bytes);
    }

    let ctx = AnalysisContext {
        location,
        heading_deg: heading,
        prior_reasoning_token: req.reasoning_token.clone(),
        destination_hint: None,
    };

    let budget = Duration::from_millis(state.config.horizon_timeout_ms);
    let started = Instant::now();
    let result = tokio::time::timeout(
        budget,
        client.analyze_horizon(&jpeg, &ctx, &req.visible_pois),
    )
    .await;
    state
        .metrics
        .record_ai_latency(started.elapsed().as_secs_f64() * 1000.0);

    match result {
        Err(_) => {
            let message = format!("horizon analysis exceeded {}ms", budget.as_millis());
            state.metrics.record_ai_error("timeout", &message);
            Ok(passthrough(&req.visible_pois, None, Some(message)))
        }
        Ok(Err(err)) => {
            let message = err.to_string();
            state
                .metrics
                .record_ai_error("upstream_unavailable", &message);
            Ok(passthrough(&req.visible_pois, None, Some(message)))
        }
        Ok(Ok(outcome)) => {
            // A response without refined_pois never drops POIs silently:
            // the safe default is "assume unoccluded".
            let refined_pois = outcome.data.refined_pois.unwrap_or_else(|| {
                req.visible_pois.iter().map(RefinedPoi::unrefined).collect()
            });
            Ok(HorizonResponse {
                horizon_line_y_percent: outcome.data.horizon_line_y_percent,
                skyline_features: outcome.data.skyline_features,
                refined_pois,
                reasoning_token: outcome.reasoning_token,
                skipped_reason: None,
                error: None,
            })
        }
    }
}

fn decode_image(image_b64: &str) -> Result<Vec<u8>, String> {
    let data = match image_b64.split_once(',') {
        Some((_, tail)) => tail,
        None => image_b64,
    };
    let data = data.trim();
    if data.is_empty() {
        return Err("empty image payload".to_string());
    }
    STANDARD
        .decode(data)
        .map_err(|err| format!("invalid base64 image: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use nav_core::models::PoiAction;

    fn pois() -> Vec<VisiblePoi> {
        vec![
            VisiblePoi {
                name: "Kisumu City".to_string(),
                bearing_degrees: 87.0,
                distance_meters: 12_400.0,
            },
            VisiblePoi {
                name: "Radio Mast".to_string(),
                bearing_degrees: 101.5,
                distance_meters: 3_200.0,
            },
        ]
    }

    #[test]
    fn passthrough_preserves_every_poi() {
        let input = pois();
        let response = passthrough(&input, Some("flat_terrain".to_string()), None);

        assert_eq!(response.refined_pois.len(), input.len());
        for (refined, original) in response.refined_pois.iter().zip(&input) {
            assert_eq!(refined.name, original.name);
            assert_eq!(refined.original_bearing, original.bearing_degrees);
            assert_eq!(refined.action, PoiAction::Show);
            assert_eq!(refined.vertical_adjustment, 0.0);
        }
        assert!(response.skyline_features.is_empty());
        assert_eq!(response.skipped_reason.as_deref(), Some("flat_terrain"));
    }

    #[tokio::test]
    async fn failure_returns_unrefined_list_with_error() {
        // No elevation provider (gate fails closed) and no vision client:
        // the POIs must come back unmodified with an error indicator.
        let state = AppState::new(crate::config::Config::for_tests());
        let request = HorizonRequest {
            image: STANDARD.encode(b"frame"),
            latitude: -0.0917,
            longitude: 34.7680,
            heading: 90.0,
            visible_pois: pois(),
            reasoning_token: None,
        };

        let response = analyze_horizon(&state, request).await.unwrap();
        assert_eq!(response.refined_pois.len(), 2);
        assert!(response.error.is_some());
        assert!(response.skipped_reason.is_none());
    }
}
