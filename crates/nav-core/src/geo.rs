//! Spherical geodesy for bearing, distance, and AR elevation math.

use crate::models::GeoPoint;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Visual beam height at 1 km or closer, in client render units.
const VISUAL_BASE_HEIGHT: f64 = 30.0;
/// Floor for very distant targets.
const VISUAL_MIN_HEIGHT: f64 = 5.0;

/// Initial great-circle bearing from `a` to `b` in degrees, 0 = north,
/// measured clockwise, normalized to [0, 360).
///
/// Coincident points resolve to 0 by convention. For antipodal points the
/// bearing is mathematically undefined; the formula's atan2 output is
/// returned as-is (deterministic, documented edge case).
pub fn bearing(a: &GeoPoint, b: &GeoPoint) -> f64 {
    if a.latitude == b.latitude && a.longitude == b.longitude {
        return 0.0;
    }

    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();

    let x = dlambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    (x.atan2(y).to_degrees() + 360.0).rem_euclid(360.0)
}

/// Haversine great-circle distance between two points in meters.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let dphi = (b.latitude - a.latitude).to_radians();
    let dlambda = (b.longitude - a.longitude).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Vertical angle from observer `a` to target `b` in degrees, corrected for
/// Earth's curvature so the angle matches visual appearance.
///
/// As ground distance grows the horizon drops by `d^2 / (2R)`; that drop is
/// subtracted from the raw altitude delta before the arctangent. Positive
/// means above the visual horizon, negative below. Returns 0 for coincident
/// points.
pub fn elevation_angle(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d = distance(a, b);
    if d < 1e-9 {
        return 0.0;
    }

    let delta_h = b.altitude_m - a.altitude_m;
    let horizon_drop = d * d / (2.0 * EARTH_RADIUS_M);
    let effective_delta_h = delta_h - horizon_drop;

    (effective_delta_h / d).atan().to_degrees()
}

/// Render-height hint for an AR beam at the given distance.
///
/// Inverse with distance: 30 units at 1 km or closer, shrinking toward a
/// floor of 5 units for far targets. Monotonically non-increasing.
pub fn visual_scale(distance_m: f64) -> f64 {
    let height = VISUAL_BASE_HEIGHT * (1000.0 / distance_m.max(1000.0));
    height.max(VISUAL_MIN_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn distance_one_degree_latitude() {
        // ~111km between these points (1 degree latitude)
        let d = distance(&p(0.0, 0.0), &p(1.0, 0.0));
        assert!((d - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = p(-0.0917, 34.7680);
        let b = p(-0.1022, 34.7617);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-6);
        assert!(distance(&a, &a) < 1e-6);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = p(0.0, 0.0);
        assert!((bearing(&origin, &p(1.0, 0.0)) - 0.0).abs() < 0.01);
        assert!((bearing(&origin, &p(0.0, 1.0)) - 90.0).abs() < 0.01);
        assert!((bearing(&origin, &p(-1.0, 0.0)) - 180.0).abs() < 0.01);
        assert!((bearing(&origin, &p(0.0, -1.0)) - 270.0).abs() < 0.01);
    }

    #[test]
    fn bearing_reciprocal_within_tolerance() {
        let a = p(33.6846, -117.8265);
        let b = p(33.7000, -117.8000);
        let fwd = bearing(&a, &b);
        let back = bearing(&b, &a);
        assert!((0.0..360.0).contains(&fwd));
        let diff = ((fwd + 180.0).rem_euclid(360.0) - back).abs();
        assert!(diff < 0.1, "reciprocal bearing off by {diff}");
    }

    #[test]
    fn bearing_coincident_points_is_zero() {
        let a = p(10.0, 10.0);
        assert_eq!(bearing(&a, &a), 0.0);
    }

    #[test]
    fn elevation_angle_zero_for_coincident() {
        let a = GeoPoint::with_altitude(0.0, 0.0, 100.0);
        assert_eq!(elevation_angle(&a, &a), 0.0);
    }

    #[test]
    fn elevation_angle_increases_with_target_altitude() {
        let observer = GeoPoint::with_altitude(0.0, 0.0, 0.0);
        let mut last = f64::NEG_INFINITY;
        for alt in [0.0, 100.0, 500.0, 2000.0] {
            let target = GeoPoint::with_altitude(0.0, 0.1, alt);
            let angle = elevation_angle(&observer, &target);
            assert!(angle > last, "angle must rise with altitude");
            last = angle;
        }
    }

    #[test]
    fn elevation_angle_applies_horizon_drop() {
        // Same altitude, ~50km away: curvature pulls the target below the
        // visual horizon, so the angle must be negative.
        let observer = GeoPoint::with_altitude(0.0, 0.0, 0.0);
        let target = GeoPoint::with_altitude(0.0, 0.45, 0.0);
        assert!(elevation_angle(&observer, &target) < 0.0);
    }

    #[test]
    fn visual_scale_is_non_increasing() {
        assert_eq!(visual_scale(500.0), 30.0);
        assert_eq!(visual_scale(1000.0), 30.0);
        assert_eq!(visual_scale(2_000.0), 15.0);
        assert_eq!(visual_scale(10_000.0), 5.0);
        assert_eq!(visual_scale(50_000.0), 5.0);
        assert!(visual_scale(2_000.0) <= visual_scale(1_500.0));
    }
}
