//! Core data models for the navigation analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees, altitude in meters above sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m: 0.0,
        }
    }

    pub fn with_altitude(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m,
        }
    }

    /// Validate coordinate ranges.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            errors.push(format!("latitude {} out of range [-90, 90]", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            errors.push(format!(
                "longitude {} out of range [-180, 180]",
                self.longitude
            ));
        }
        if !self.altitude_m.is_finite() {
            errors.push("altitude must be finite".to_string());
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// Normalize a compass heading into [0, 360). 360 maps to 0.
pub fn normalize_heading(heading_deg: f64) -> f64 {
    heading_deg.rem_euclid(360.0)
}

/// A named landmark from the waypoint store. Read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque reasoning-continuity handle returned by the vision capability.
/// Carried forward by the caller to the next frame; never parsed or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasoningToken(String);

impl ReasoningToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ReasoningToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Per-request context handed to the vision capability. Request-scoped.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub location: GeoPoint,
    pub heading_deg: f64,
    pub prior_reasoning_token: Option<ReasoningToken>,
    pub destination_hint: Option<String>,
}

/// Walking direction relative to the user's current heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Forward,
    Left,
    Right,
    TurnAround,
}

impl Direction {
    /// Imperative phrase used when composing instruction messages.
    pub fn phrase(&self) -> &'static str {
        match self {
            Direction::Forward => "Continue forward",
            Direction::Left => "Turn left",
            Direction::Right => "Turn right",
            Direction::TurnAround => "Turn around",
        }
    }
}

/// The pipeline's one guaranteed output: a well-formed walking instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationInstruction {
    pub direction: Direction,
    pub distance_meters: f64,
    pub message: String,
    pub confidence: f64,
}

/// A detected landscape element that may occlude a point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkylineFeature {
    #[serde(rename = "type")]
    pub kind: SkylineKind,
    pub bearing_start: f64,
    pub bearing_end: f64,
    #[serde(alias = "estimated_height_degrees")]
    pub height_angle_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkylineKind {
    Mountain,
    Building,
    Treeline,
}

/// A point of interest already inside the camera's heading cone,
/// with bearing/distance precomputed by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisiblePoi {
    pub name: String,
    pub bearing_degrees: f64,
    pub distance_meters: f64,
}

/// Marker placement decision for one POI after skyline analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiAction {
    Show,
    Hide,
    Raise,
    Lower,
}

impl Default for PoiAction {
    fn default() -> Self {
        PoiAction::Show
    }
}

/// A POI with refined AR placement from horizon analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedPoi {
    pub name: String,
    pub original_bearing: f64,
    #[serde(default)]
    pub action: PoiAction,
    #[serde(default, alias = "y_adjustment")]
    pub vertical_adjustment: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl RefinedPoi {
    /// Pass-through refinement: marker shown exactly where geometry put it.
    pub fn unrefined(poi: &VisiblePoi) -> Self {
        Self {
            name: poi.name.clone(),
            original_bearing: poi.bearing_degrees,
            action: PoiAction::Show,
            vertical_adjustment: 0.0,
            reasoning: None,
        }
    }
}
