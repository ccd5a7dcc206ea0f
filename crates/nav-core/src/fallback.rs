//! Geometry-only fallback planner.
//!
//! Produces a walking instruction from known waypoints and the current
//! heading alone. This path must always succeed: when the vision capability
//! is down, this is what the user gets.

use crate::geo;
use crate::guidance::{direction_from_heading_delta, format_distance};
use crate::models::{Direction, GeoPoint, NavigationInstruction, Waypoint};

/// Confidence attached to a nearest-waypoint instruction.
const WAYPOINT_CONFIDENCE: f64 = 0.85;
/// Confidence when nothing is nearby and we were the AI's stand-in.
const EMPTY_AI_CONFIDENCE: f64 = 0.0;
/// Confidence when nothing is nearby on the geometry-only path.
const EMPTY_GEOMETRY_CONFIDENCE: f64 = 0.5;

/// Why the fallback planner is running; decides the confidence of the
/// "continue exploring" instruction when no waypoint is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTrigger {
    /// Standing in for a failed or unavailable vision call.
    AiUnavailable,
    /// The caller asked for geometry-only planning.
    GeometryOnly,
}

/// Plan a walking instruction from nearby waypoints.
///
/// `nearby` must be ordered ascending by distance (the waypoint store's
/// `nearby` contract). A destination hint wins over proximity when a
/// matching name is present in the set.
pub fn plan_fallback(
    location: &GeoPoint,
    heading_deg: f64,
    nearby: &[Waypoint],
    destination_hint: Option<&str>,
    trigger: FallbackTrigger,
) -> NavigationInstruction {
    let target = destination_hint
        .and_then(|hint| find_named(nearby, hint))
        .or_else(|| nearby.first());

    let Some(target) = target else {
        let confidence = match trigger {
            FallbackTrigger::AiUnavailable => EMPTY_AI_CONFIDENCE,
            FallbackTrigger::GeometryOnly => EMPTY_GEOMETRY_CONFIDENCE,
        };
        return NavigationInstruction {
            direction: Direction::Forward,
            distance_meters: 0.0,
            message: "Continue exploring".to_string(),
            confidence,
        };
    };

    let target_bearing = geo::bearing(location, &target.location);
    let distance_m = geo::distance(location, &target.location);
    let delta = (target_bearing - heading_deg + 360.0).rem_euclid(360.0);
    let direction = direction_from_heading_delta(delta);

    NavigationInstruction {
        direction,
        distance_meters: distance_m,
        message: format!(
            "{} towards {}, {}",
            direction.phrase(),
            target.name,
            format_distance(distance_m)
        ),
        confidence: WAYPOINT_CONFIDENCE,
    }
}

fn find_named<'a>(waypoints: &'a [Waypoint], hint: &str) -> Option<&'a Waypoint> {
    let hint = hint.trim();
    if hint.is_empty() {
        return None;
    }
    let hint_lower = hint.to_lowercase();
    waypoints
        .iter()
        .find(|w| w.name.to_lowercase().contains(&hint_lower))
}
