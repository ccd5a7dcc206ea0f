//! Turn-guidance state derivation and instruction phrasing.
//!
//! Pure heading math: no persistence, no I/O. The server layer decides
//! whether a phrase comes from the vision capability or from the templates
//! here.

use crate::models::Direction;
use serde::{Deserialize, Serialize};

/// Heading error below which the user counts as facing the target.
const ALIGNED_TOLERANCE_DEG: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    Aligned,
    TurningLeft,
    TurningRight,
}

/// Result of comparing the user's heading with a target bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub status: AlignmentStatus,
    /// Signed turn in degrees, normalized to (-180, 180].
    /// Positive = turn left, negative = turn right.
    pub turn_degrees: f64,
}

/// Derive the alignment state for a user at `user_heading` facing toward
/// `target_bearing` (both compass degrees).
pub fn turn_state(user_heading: f64, target_bearing: f64) -> TurnState {
    let mut delta = (target_bearing - user_heading + 360.0).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }

    let status = if delta.abs() < ALIGNED_TOLERANCE_DEG {
        AlignmentStatus::Aligned
    } else if delta < 0.0 {
        AlignmentStatus::TurningRight
    } else {
        AlignmentStatus::TurningLeft
    };

    TurnState {
        status,
        turn_degrees: delta,
    }
}

/// Map a raw heading delta in [0, 360) to a walking direction.
///
/// Used by the geometry fallback: the delta is `bearing - heading` before
/// normalization to signed form.
pub fn direction_from_heading_delta(delta_deg: f64) -> Direction {
    let delta = delta_deg.rem_euclid(360.0);
    if !(45.0..=315.0).contains(&delta) {
        Direction::Forward
    } else if delta < 135.0 {
        Direction::Right
    } else if delta < 225.0 {
        Direction::TurnAround
    } else {
        Direction::Left
    }
}

/// Map a model-reported bearing adjustment (signed degrees, positive = turn
/// right) to a walking direction.
pub fn direction_from_adjustment(adjustment_deg: f64) -> Direction {
    let magnitude = adjustment_deg.abs();
    if magnitude <= 22.5 {
        Direction::Forward
    } else if magnitude > 90.0 {
        Direction::TurnAround
    } else if adjustment_deg > 0.0 {
        Direction::Right
    } else {
        Direction::Left
    }
}

/// Human-friendly distance string.
///
/// Exact meters under 50 m, nearest 50 m bucket under 1 km, one-decimal
/// kilometers beyond that.
pub fn format_distance(distance_m: f64) -> String {
    let distance_m = distance_m.max(0.0);
    if distance_m < 50.0 {
        format!("{}m ahead", distance_m.round() as i64)
    } else if distance_m < 1000.0 {
        let bucket = (distance_m / 50.0).round() as i64 * 50;
        format!("{bucket}m away")
    } else {
        format!("{:.1}km away", distance_m / 1000.0)
    }
}

/// Confirmation message when the user already faces the target.
pub fn aligned_message(poi_name: &str, distance_m: f64) -> String {
    if distance_m < 1000.0 {
        format!(
            "Perfect! {} is about {} meters straight ahead.",
            poi_name,
            distance_m.round() as i64
        )
    } else {
        format!(
            "Perfect! {} is about {:.1} kilometers straight ahead.",
            poi_name,
            distance_m / 1000.0
        )
    }
}

/// Deterministic phrase used when the vision capability cannot supply one.
pub fn turn_template(state: &TurnState) -> String {
    let direction = if state.turn_degrees > 0.0 {
        "left"
    } else {
        "right"
    };
    format!("Turn {} about {:.0}°", direction, state.turn_degrees.abs())
}
