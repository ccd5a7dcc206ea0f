//! Turn guidance with an AI-assisted phrase and a deterministic fallback.
//!
//! The alignment math is pure (`nav_core::guidance`); this module only
//! decides where the phrase comes from. It never fails the caller.

use crate::state::AppState;
use nav_core::guidance::{aligned_message, turn_state, turn_template, AlignmentStatus};
use nav_core::PipelineError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Deserialize)]
pub struct TurnGuidanceRequest {
    pub user_heading: f64,
    pub target_bearing: f64,
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default = "default_poi_name")]
    pub poi_name: String,
}

fn default_poi_name() -> String {
    "target".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnGuidanceResponse {
    pub text: String,
    pub alignment_status: AlignmentStatus,
    pub turn_degrees: f64,
}

pub async fn turn_guidance(
    state: &AppState,
    req: TurnGuidanceRequest,
) -> Result<TurnGuidanceResponse, PipelineError> {
    if !req.user_heading.is_finite() || !req.target_bearing.is_finite() {
        return Err(PipelineError::Validation(
            "headings must be finite".to_string(),
        ));
    }

    let turn = turn_state(req.user_heading, req.target_bearing);

    // Facing the target already: a template is enough, no model call.
    if turn.status == AlignmentStatus::Aligned {
        return Ok(TurnGuidanceResponse {
            text: aligned_message(&req.poi_name, req.distance_meters.max(0.0)),
            alignment_status: turn.status,
            turn_degrees: turn.turn_degrees,
        });
    }

    let direction = if turn.turn_degrees > 0.0 {
        "left"
    } else {
        "right"
    };

    let text = match &state.vision {
        Some(client) => {
            let budget = Duration::from_millis(state.config.phrase_timeout_ms);
            let started = Instant::now();
            let result = tokio::time::timeout(
                budget,
                client.turn_phrase(
                    &req.poi_name,
                    direction,
                    turn.turn_degrees.abs(),
                    req.distance_meters.max(0.0) / 1000.0,
                ),
            )
            .await;
            state
                .metrics
                .record_ai_latency(started.elapsed().as_secs_f64() * 1000.0);

            match result {
                Ok(Ok(phrase)) => phrase,
                Ok(Err(err)) => {
                    state
                        .metrics
                        .record_ai_error("upstream_unavailable", &err.to_string());
                    turn_template(&turn)
                }
                Err(_) => {
                    state.metrics.record_ai_error("timeout", "turn phrase timed out");
                    turn_template(&turn)
                }
            }
        }
        None => turn_template(&turn),
    };

    Ok(TurnGuidanceResponse {
        text,
        alignment_status: turn.status,
        turn_degrees: turn.turn_degrees,
    })
}
