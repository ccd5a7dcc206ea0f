//! In-memory waypoint store.
//!
//! Stands in for the external persistent store behind the same `nearby`
//! contract: ordered ascending by distance, radius-bounded, limited.

use dashmap::DashMap;
use nav_core::geo;
use nav_core::models::{GeoPoint, Waypoint};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct SeedWaypoint {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude_m: f64,
    #[serde(default)]
    description: String,
}

pub struct WaypointStore {
    inner: DashMap<String, Waypoint>,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn insert(
        &self,
        name: impl Into<String>,
        location: GeoPoint,
        description: impl Into<String>,
    ) -> Waypoint {
        let waypoint = Waypoint {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            location,
            description: description.into(),
            created_at: chrono::Utc::now(),
        };
        self.inner.insert(waypoint.id.clone(), waypoint.clone());
        waypoint
    }

    /// Load waypoints from a JSON seed file
    /// (`[{"name", "latitude", "longitude", "altitude_m", "description"}]`).
    pub fn load_seed(&self, path: &str) -> anyhow::Result<usize> {
        let raw = std::fs::read_to_string(path)?;
        let seeds: Vec<SeedWaypoint> = serde_json::from_str(&raw)?;
        let count = seeds.len();
        for seed in seeds {
            self.insert(
                seed.name,
                GeoPoint::with_altitude(seed.latitude, seed.longitude, seed.altitude_m),
                seed.description,
            );
        }
        Ok(count)
    }

    /// Waypoints within `radius_m` of `center`, ascending by distance.
    pub fn nearby(&self, center: &GeoPoint, radius_m: f64, limit: usize) -> Vec<Waypoint> {
        let mut candidates: Vec<(f64, Waypoint)> = self
            .inner
            .iter()
            .filter_map(|entry| {
                let dist = geo::distance(center, &entry.value().location);
                (dist <= radius_m).then(|| (dist, entry.value().clone()))
            })
            .collect();

        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates
            .into_iter()
            .take(limit)
            .map(|(_, waypoint)| waypoint)
            .collect()
    }

    /// Case-insensitive partial name match; first hit wins.
    pub fn find_by_name(&self, query: &str) -> Option<Waypoint> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.inner
            .iter()
            .find(|entry| entry.value().name.to_lowercase().contains(&query))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for WaypointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_orders_ascending_and_respects_radius() {
        let store = WaypointStore::new();
        let center = GeoPoint::new(0.0, 0.0);
        store.insert("Far", GeoPoint::new(0.004, 0.0), ""); // ~444m
        store.insert("Near", GeoPoint::new(0.001, 0.0), ""); // ~111m
        store.insert("Outside", GeoPoint::new(0.02, 0.0), ""); // ~2.2km

        let found = store.nearby(&center, 500.0, 5);
        let names: Vec<_> = found.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[test]
    fn nearby_applies_limit() {
        let store = WaypointStore::new();
        let center = GeoPoint::new(0.0, 0.0);
        for i in 0..10 {
            store.insert(format!("wp{i}"), GeoPoint::new(0.0001 * i as f64, 0.0), "");
        }
        assert_eq!(store.nearby(&center, 500.0, 3).len(), 3);
    }

    #[test]
    fn find_by_name_is_case_insensitive_partial() {
        let store = WaypointStore::new();
        store.insert("Sunny's Cafe", GeoPoint::new(0.0, 0.0), "");
        assert!(store.find_by_name("sunny").is_some());
        assert!(store.find_by_name("CAFE").is_some());
        assert!(store.find_by_name("opera").is_none());
        assert!(store.find_by_name("  ").is_none());
    }
}
