//! Vision model API HTTP client.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use nav_core::models::{
    AnalysisContext, ReasoningToken, RefinedPoi, SkylineFeature, VisiblePoi, Waypoint,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::prompts;

/// Safe defaults used when the model omits required fields.
const DEFAULT_INSTRUCTION: &str = "Continue forward";
const DEFAULT_LANDMARK: &str = "Unknown";
/// Confidence when the response was complete but carried no confidence.
const COMPLETE_DEFAULT_CONFIDENCE: f64 = 0.8;
/// Confidence when required fields had to be filled in.
const PARTIAL_DEFAULT_CONFIDENCE: f64 = 0.5;

/// HTTP client for the vision-reasoning capability.
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Typed result plus the reasoning token for the next frame.
#[derive(Debug, Clone)]
pub struct VisionOutcome<T> {
    pub data: T,
    pub reasoning_token: Option<ReasoningToken>,
}

/// Normalized navigation-frame analysis from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub instruction: String,
    pub bearing_adjustment: f64,
    pub landmark: String,
    pub confidence: f64,
    pub is_lost: bool,
}

/// Skyline analysis from the model. `refined_pois` stays optional so the
/// caller can substitute the unmodified input list when it is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct HorizonAnalysis {
    #[serde(default = "default_horizon_line")]
    pub horizon_line_y_percent: f64,
    #[serde(default)]
    pub skyline_features: Vec<SkylineFeature>,
    #[serde(default)]
    pub refined_pois: Option<Vec<RefinedPoi>>,
}

fn default_horizon_line() -> f64 {
    50.0
}

/// One waypoint's entry in an offline route manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCue {
    pub waypoint_name: String,
    #[serde(default)]
    pub visual_cue: String,
    #[serde(default)]
    pub landmarks: Vec<String>,
    #[serde(default)]
    pub approach_hint: String,
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    model: &'a str,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_token: Option<&'a str>,
    response_mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    output: String,
    #[serde(default)]
    reasoning_token: Option<String>,
}

impl VisionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Analyze a camera frame and return a structured walking instruction.
    ///
    /// The image must already be transport-ready JPEG bytes. Partial model
    /// output is normalized with safe defaults; a malformed response is an
    /// error the caller recovers from with the fallback planner.
    pub async fn analyze_frame(
        &self,
        image_jpeg: &[u8],
        ctx: &AnalysisContext,
    ) -> Result<VisionOutcome<FrameAnalysis>> {
        let prompt = prompts::navigation_frame(ctx);
        let response = self
            .invoke(
                prompt,
                Some(image_jpeg),
                ctx.prior_reasoning_token.as_ref(),
                "application/json",
            )
            .await?;

        let value: Value = serde_json::from_str(&response.output)
            .context("Failed to parse frame analysis as JSON")?;

        Ok(VisionOutcome {
            data: frame_from_value(&value),
            reasoning_token: response.reasoning_token.map(ReasoningToken::new),
        })
    }

    /// Analyze the skyline to refine POI marker placement.
    pub async fn analyze_horizon(
        &self,
        image_jpeg: &[u8],
        ctx: &AnalysisContext,
        visible_pois: &[VisiblePoi],
    ) -> Result<VisionOutcome<HorizonAnalysis>> {
        let prompt = prompts::horizon(ctx, visible_pois);
        let response = self
            .invoke(
                prompt,
                Some(image_jpeg),
                ctx.prior_reasoning_token.as_ref(),
                "application/json",
            )
            .await?;

        let analysis: HorizonAnalysis = serde_json::from_str(&response.output)
            .context("Failed to parse horizon analysis as JSON")?;

        if analysis.refined_pois.is_none() {
            tracing::warn!("horizon analysis missing refined_pois");
        }

        Ok(VisionOutcome {
            data: analysis,
            reasoning_token: response.reasoning_token.map(ReasoningToken::new),
        })
    }

    /// Generate a short encouraging turn phrase.
    pub async fn turn_phrase(
        &self,
        poi_name: &str,
        direction: &str,
        turn_amount_deg: f64,
        distance_km: f64,
    ) -> Result<String> {
        let prompt = prompts::turn_phrase(poi_name, direction, turn_amount_deg, distance_km);
        let response = self.invoke(prompt, None, None, "text/plain").await?;

        let text = response.output.trim().to_string();
        if text.is_empty() {
            anyhow::bail!("empty turn phrase from model");
        }
        Ok(text)
    }

    /// Pre-analyze a route into an offline visual manifest.
    pub async fn route_preview(
        &self,
        user_location: (f64, f64),
        waypoints: &[Waypoint],
    ) -> Result<Vec<RouteCue>> {
        let prompt = prompts::route_preview(user_location, waypoints);
        let response = self.invoke(prompt, None, None, "application/json").await?;

        serde_json::from_str(&response.output).context("Failed to parse route preview as JSON")
    }

    async fn invoke(
        &self,
        prompt: String,
        image_jpeg: Option<&[u8]>,
        reasoning_token: Option<&ReasoningToken>,
        response_mime_type: &str,
    ) -> Result<InvokeResponse> {
        let url = format!("{}/v1/generate", self.base_url);

        let request = InvokeRequest {
            model: &self.model,
            prompt,
            image_b64: image_jpeg.map(|bytes| STANDARD.encode(bytes)),
            reasoning_token: reasoning_token.map(ReasoningToken::as_str),
            response_mime_type,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to reach vision capability")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Vision capability request failed: {} {}",
                status,
                body
            ));
        }

        let payload = response
            .json::<InvokeResponse>()
            .await
            .context("Failed to parse vision capability response")?;

        Ok(payload)
    }
}

/// Normalize a frame-analysis JSON object, filling absent required fields
/// with safe defaults instead of failing.
fn frame_from_value(value: &Value) -> FrameAnalysis {
    let landmark_field = value
        .get("landmark")
        .or_else(|| value.get("landmark_identified"));

    let complete = value.get("instruction").is_some()
        && value.get("bearing_adjustment").is_some()
        && landmark_field.is_some();
    if !complete {
        tracing::warn!("incomplete frame analysis from model, filling defaults");
    }
    let default_confidence = if complete {
        COMPLETE_DEFAULT_CONFIDENCE
    } else {
        PARTIAL_DEFAULT_CONFIDENCE
    };

    FrameAnalysis {
        instruction: value
            .get("instruction")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INSTRUCTION)
            .to_string(),
        bearing_adjustment: value
            .get("bearing_adjustment")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(-180.0, 180.0),
        landmark: landmark_field
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LANDMARK)
            .to_string(),
        confidence: value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(default_confidence)
            .clamp(0.0, 1.0),
        is_lost: value.get("is_lost").and_then(Value::as_bool).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_frame_passes_through() {
        let value = json!({
            "instruction": "Turn right towards the yellow cafe building",
            "bearing_adjustment": 45,
            "landmark_identified": "Sunny's Cafe",
            "confidence": 0.85,
            "is_lost": false
        });
        let frame = frame_from_value(&value);
        assert_eq!(frame.landmark, "Sunny's Cafe");
        assert!((frame.bearing_adjustment - 45.0).abs() < 1e-9);
        assert!((frame.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn missing_confidence_defaults_to_point_eight() {
        let value = json!({
            "instruction": "Keep walking straight",
            "bearing_adjustment": 0,
            "landmark": "Clock Tower"
        });
        let frame = frame_from_value(&value);
        assert!((frame.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn partial_frame_fills_safe_defaults() {
        let value = json!({ "instruction": "Head north" });
        let frame = frame_from_value(&value);
        assert_eq!(frame.landmark, "Unknown");
        assert_eq!(frame.bearing_adjustment, 0.0);
        assert!((frame.confidence - 0.5).abs() < 1e-9);
        assert!(!frame.is_lost);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let value = json!({
            "instruction": "x",
            "bearing_adjustment": 400,
            "landmark": "y",
            "confidence": 3.0
        });
        let frame = frame_from_value(&value);
        assert_eq!(frame.bearing_adjustment, 180.0);
        assert_eq!(frame.confidence, 1.0);
    }

    #[test]
    fn horizon_analysis_tolerates_missing_fields() {
        let analysis: HorizonAnalysis = serde_json::from_str("{}").unwrap();
        assert_eq!(analysis.horizon_line_y_percent, 50.0);
        assert!(analysis.skyline_features.is_empty());
        assert!(analysis.refined_pois.is_none());
    }
}
