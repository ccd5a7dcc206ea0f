//! The navigation analysis pipeline.
//!
//! Per-request state machine: INIT -> IMAGE_PREPARED -> MODEL_INVOKED ->
//! PARSED | FAILED. Every FAILED transition lands in the geometry fallback,
//! so the caller always receives a well-formed instruction. The result
//! cache is bypassed whenever a reasoning token is present: a
//! context-carrying request must not be satisfied from a context-free
//! cache entry.

use crate::cache::CacheKey;
use crate::imaging;
use crate::state::AppState;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use nav_core::fallback::{plan_fallback, FallbackTrigger};
use nav_core::guidance::direction_from_adjustment;
use nav_core::models::{
    normalize_heading, AnalysisContext, GeoPoint, NavigationInstruction, ReasoningToken,
};
use nav_core::{geo, PipelineError};
use nav_vision::{FrameAnalysis, RouteCue, VisionOutcome};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize)]
pub struct FrameRequest {
    pub image: String,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    #[serde(default)]
    pub reasoning_token: Option<ReasoningToken>,
    #[serde(default)]
    pub destination: Option<String>,
}

/// Where the returned instruction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Model,
    Fallback,
    Cache,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameResponse {
    pub instruction: NavigationInstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    pub is_lost: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_token: Option<ReasoningToken>,
    pub source: AnalysisSource,
}

enum ModelOutcome {
    Parsed(VisionOutcome<FrameAnalysis>),
    Failed { kind: &'static str, message: String },
}

/// Analyze one camera frame.
///
/// Only malformed coordinates or heading surface as errors; every upstream
/// problem degrades to the fallback planner.
pub async fn analyze_frame(
    state: &AppState,
    req: FrameRequest,
) -> Result<FrameResponse, PipelineError> {
    let location = GeoPoint::new(req.latitude, req.longitude);
    let errors = location.validate();
    if !errors.is_empty() {
        return Err(PipelineError::Validation(errors.join("; ")));
    }
    if !req.heading.is_finite() {
        return Err(PipelineError::Validation("heading must be finite".to_string()));
    }
    let heading = normalize_heading(req.heading);

    state.metrics.increment_request_count();

    let key = CacheKey::quantize(location.latitude, location.longitude, heading);
    let bypass_cache = req.reasoning_token.is_some();
    if !bypass_cache {
        if let Some(hit) = state.cache.get(&key) {
            tracing::debug!("cache hit for quantized frame key");
            return Ok(FrameResponse {
                instruction: hit,
                landmark: None,
                is_lost: false,
                reasoning_token: None,
                source: AnalysisSource::Cache,
            });
        }
    }

    let nearby = state
        .waypoints
        .nearby(&location, state.config.nearby_radius_m, 5);

    let ctx = AnalysisContext {
        location,
        heading_deg: heading,
        prior_reasoning_token: req.reasoning_token.clone(),
        destination_hint: req.destination.clone(),
    };

    let outcome = invoke_model(state, &req.image, &ctx).await;

    let response = match outcome {
        ModelOutcome::Parsed(VisionOutcome {
            data,
            reasoning_token,
        }) => {
            let direction = direction_from_adjustment(data.bearing_adjustment);
            let distance_meters = nearby
                .first()
                .map(|w| geo::distance(&location, &w.location))
                .unwrap_or(0.0);
            let instruction = NavigationInstruction {
                direction,
                distance_meters,
                message: data.instruction,
                confidence: data.confidence,
            };

            FrameResponse {
                instruction,
                landmark: Some(data.landmark),
                is_lost: data.is_lost,
                reasoning_token,
                source: AnalysisSource::Model,
            }
        }
        ModelOutcome::Failed { kind, message } => {
            tracing::warn!("frame analysis degraded to fallback ({kind}): {message}");
            state.metrics.record_ai_error(kind, &message);
            state.metrics.increment_fallback_count();

            let instruction = plan_fallback(
                &location,
                heading,
                &nearby,
                req.destination.as_deref(),
                FallbackTrigger::AiUnavailable,
            );

            // A token from a failed turn must not be carried forward.
            FrameResponse {
                instruction,
                landmark: None,
                is_lost: false,
                reasoning_token: None,
                source: AnalysisSource::Fallback,
            }
        }
    };

    if !bypass_cache {
        state.cache.put(
            key,
            response.instruction.clone(),
            Duration::from_secs(state.config.cache_ttl_s),
        );
    }

    Ok(response)
}

/// IMAGE_PREPARED and MODEL_INVOKED stages.
async fn invoke_model(state: &AppState, image_b64: &str, ctx: &AnalysisContext) -> ModelOutcome {
    let Some(client) = &state.vision else {
        return ModelOutcome::Failed {
            kind: "not_configured",
            message: "vision client not configured".to_string(),
        };
    };

    let image = match decode_transport_image(image_b64) {
        Ok(bytes) => bytes,
        Err(message) => {
            return ModelOutcome::Failed {
                kind: "image_decode",
                message,
            }
        }
    };

    let (jpeg, stats) = imaging::compress_jpeg(&image);
    if let Some(stats) = stats {
        state
            .metrics
            .record_compression(stats.original_bytes, stats.compressed_bytes);
    }

    let budget = Duration::from_millis(state.config.frame_timeout_ms);
    let started = Instant::now();
    let result = tokio::time::timeout(budget, client.analyze_frame(&jpeg, ctx)).await;
    state
        .metrics
        .record_ai_latency(started.elapsed().as_secs_f64() * 1000.0);

    match result {
        Err(_) => ModelOutcome::Failed {
            kind: "timeout",
            message: format!("model call exceeded {}ms", budget.as_millis()),
        },
        Ok(Err(err)) => ModelOutcome::Failed {
            kind: "upstream_unavailable",
            message: err.to_string(),
        },
        Ok(Ok(outcome)) => ModelOutcome::Parsed(outcome),
    }
}

/// Pre-analyze a route into an offline visual manifest.
///
/// This endpoint has no geometric fallback; unavailability surfaces as
/// `UpstreamUnavailable` to its caller alone.
pub async fn route_preview(
    state: &AppState,
    location: GeoPoint,
    waypoints: &[nav_core::models::Waypoint],
) -> Result<Vec<RouteCue>, PipelineError> {
    let errors = location.validate();
    if !errors.is_empty() {
        return Err(PipelineError::Validation(errors.join("; ")));
    }
    if waypoints.is_empty() {
        return Err(PipelineError::Validation(
            "route preview requires at least one waypoint".to_string(),
        ));
    }

    let Some(client) = &state.vision else {
        return Err(PipelineError::UpstreamUnavailable(
            "vision client not configured".to_string(),
        ));
    };

    let budget = Duration::from_millis(state.config.route_timeout_ms);
    let started = Instant::now();
    let result = tokio::time::timeout(
        budget,
        client.route_preview((location.latitude, location.longitude), waypoints),
    )
    .await;
    state
        .metrics
        .record_ai_latency(started.elapsed().as_secs_f64() * 1000.0);

    match result {
        Err(_) => {
            let message = format!("route preview exceeded {}ms", budget.as_millis());
            state.metrics.record_ai_error("timeout", &message);
            Err(PipelineError::UpstreamUnavailable(message))
        }
        Ok(Err(err)) => {
            state
                .metrics
                .record_ai_error("upstream_unavailable", &err.to_string());
            Err(PipelineError::UpstreamUnavailable(err.to_string()))
        }
        Ok(Ok(cues)) => Ok(cues),
    }
}

fn decode_transport_image(image_b64: &str) -> Result<Vec<u8>, String> {
    // Tolerate data URI prefixes ("data:image/jpeg;base64,...").
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
    use crate::config::Config;
    use base64::Engine;

    fn test_config() -> Config {
        Config::for_tests()
    }

    fn frame_request() -> FrameRequest {
        FrameRequest {
            image: STANDARD.encode(b"fake jpeg bytes"),
            latitude: -0.0917,
            longitude: 34.7680,
            heading: 90.0,
            reasoning_token: None,
            destination: None,
        }
    }

    #[tokio::test]
    async fn forced_ai_failure_still_returns_instruction() {
        let state = AppState::new(test_config());
        let response = analyze_frame(&state, frame_request()).await.unwrap();

        assert_eq!(response.source, AnalysisSource::Fallback);
        assert!((0.0..=1.0).contains(&response.instruction.confidence));
        assert!(response.reasoning_token.is_none());
        assert_eq!(state.metrics.request_count(), 1);
        assert_eq!(state.metrics.fallback_count(), 1);
    }

    #[tokio::test]
    async fn fallback_uses_nearby_waypoint() {
        let state = AppState::new(test_config());
        state.waypoints.insert(
            "Market Hall",
            GeoPoint::new(-0.0917, 34.7690),
            "covered market",
        );

        let response = analyze_frame(&state, frame_request()).await.unwrap();
        assert!(response.instruction.message.contains("Market Hall"));
        assert!(response.instruction.distance_meters > 0.0);
    }

    #[tokio::test]
    async fn second_frame_is_served_from_cache() {
        let state = AppState::new(test_config());

        let first = analyze_frame(&state, frame_request()).await.unwrap();
        assert_eq!(first.source, AnalysisSource::Fallback);

        let mut jittered = frame_request();
        jittered.latitude += 0.00002;
        jittered.heading += 3.0;
        let second = analyze_frame(&state, jittered).await.unwrap();
        assert_eq!(second.source, AnalysisSource::Cache);
        assert_eq!(second.instruction, first.instruction);
    }

    #[tokio::test]
    async fn reasoning_token_bypasses_cache() {
        let state = AppState::new(test_config());
        analyze_frame(&state, frame_request()).await.unwrap();

        let mut with_token = frame_request();
        with_token.reasoning_token = Some(ReasoningToken::new("opaque-blob"));
        let response = analyze_frame(&state, with_token).await.unwrap();

        // A context-carrying request must never come out of the cache.
        assert_eq!(response.source, AnalysisSource::Fallback);
    }

    #[tokio::test]
    async fn bad_coordinates_are_surfaced() {
        let state = AppState::new(test_config());
        let mut bad = frame_request();
        bad.latitude = 91.0;

        let err = analyze_frame(&state, bad).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn route_preview_without_vision_is_upstream_error() {
        let state = AppState::new(test_config());
        let waypoints = vec![nav_core::models::Waypoint {
            id: "wp-1".to_string(),
            name: "Market Hall".to_string(),
            location: GeoPoint::new(0.0, 0.0),
            description: String::new(),
            created_at: chrono::Utc::now(),
        }];

        let err = route_preview(&state, GeoPoint::new(0.0, 0.0), &waypoints)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamUnavailable(_)));
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        let encoded = STANDARD.encode(b"pixels");
        let uri = format!("data:image/jpeg;base64,{encoded}");
        assert_eq!(decode_transport_image(&uri).unwrap(), b"pixels");
        assert!(decode_transport_image("not base64!!!").is_err());
        assert!(decode_transport_image("").is_err());
    }
}
