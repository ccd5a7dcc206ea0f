//! Elevation lookups and the flat-terrain gate.
//!
//! The gate decides whether skyline analysis can be skipped outright. It is
//! a cost optimization, never a correctness requirement, so every lookup
//! failure fails CLOSED: terrain is treated as complex and analysis runs.

use crate::cache::{prune_cache, CacheEntry};
use dashmap::DashMap;
use nav_core::models::GeoPoint;
use nav_core::PipelineError;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Rough equatorial conversion used for the cross-pattern offsets. Error at
/// navigation scales is acceptable for a flatness check.
pub const DEG_PER_METER_EQUATOR: f64 = 1.0 / 111_000.0;
/// Terrain with less vertical spread than this counts as flat.
pub const FLAT_VARIATION_M: f64 = 100.0;

const ELEVATION_CACHE_TTL: Duration = Duration::from_secs(3600);
const ELEVATION_CACHE_MAX_ENTRIES: usize = 50_000;

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    elevation: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
struct ElevationCacheEntry {
    fetched_at: Instant,
    elevation_m: f64,
}

impl CacheEntry for ElevationCacheEntry {
    fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

pub struct TerrainService {
    client: reqwest::Client,
    provider_url: String,
    timeout: Duration,
    cache: DashMap<String, ElevationCacheEntry>,
}

impl TerrainService {
    pub fn new(provider_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_url: provider_url.into(),
            timeout: Duration::from_millis(timeout_ms.max(500)),
            cache: DashMap::new(),
        }
    }

    /// Elevation in meters above sea level at one point.
    pub async fn elevation(&self, lat: f64, lon: f64) -> Result<f64, PipelineError> {
        let samples = self.fetch_batch(&[(lat, lon)]).await?;
        samples
            .first()
            .copied()
            .ok_or_else(|| PipelineError::TerrainLookup("empty elevation response".to_string()))
    }

    /// Decide whether skyline analysis may be skipped for this observer.
    ///
    /// Samples the center plus four offsets (±radius on each axis) and skips
    /// only when the spread is under `FLAT_VARIATION_M`. Any failure returns
    /// skip=false.
    pub async fn should_skip_analysis(
        &self,
        center: &GeoPoint,
        radius_m: f64,
    ) -> (bool, String) {
        if self.provider_url.trim().is_empty() {
            return (false, "elevation provider not configured".to_string());
        }

        let offset_deg = radius_m * DEG_PER_METER_EQUATOR;
        let points = [
            (center.latitude, center.longitude),
            (center.latitude + offset_deg, center.longitude),
            (center.latitude - offset_deg, center.longitude),
            (center.latitude, center.longitude + offset_deg),
            (center.latitude, center.longitude - offset_deg),
        ];

        match self.fetch_batch(&points).await {
            Ok(samples) => evaluate_samples(&samples),
            Err(err) => {
                tracing::warn!("terrain gate lookup failed, failing closed: {err}");
                (false, "elevation lookup failed".to_string())
            }
        }
    }

    /// One provider round trip for a batch of points, cache-aware.
    async fn fetch_batch(&self, points: &[(f64, f64)]) -> Result<Vec<f64>, PipelineError> {
        if self.provider_url.trim().is_empty() {
            return Err(PipelineError::TerrainLookup(
                "elevation provider URL is empty".to_string(),
            ));
        }

        let mut results = vec![f64::NAN; points.len()];
        let mut missing: Vec<usize> = Vec::new();
        for (idx, (lat, lon)) in points.iter().enumerate() {
            match self.cache.get(&cache_key(*lat, *lon)) {
                Some(entry) if entry.fetched_at.elapsed() <= ELEVATION_CACHE_TTL => {
                    results[idx] = entry.elevation_m;
                }
                _ => missing.push(idx),
            }
        }

        if !missing.is_empty() {
            let lat_param = join_params(missing.iter().map(|&i| points[i].0));
            let lon_param = join_params(missing.iter().map(|&i| points[i].1));
            let url = build_provider_url(&self.provider_url, &lat_param, &lon_param);

            let response = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|err| PipelineError::TerrainLookup(err.to_string()))?;

            if !response.status().is_success() {
                return Err(PipelineError::TerrainLookup(format!(
                    "elevation provider HTTP {}",
                    response.status()
                )));
            }

            let payload: ElevationResponse = response
                .json()
                .await
                .map_err(|err| PipelineError::TerrainLookup(err.to_string()))?;
            let chunk = payload.elevation.ok_or_else(|| {
                PipelineError::TerrainLookup("elevation provider missing elevation".to_string())
            })?;

            if chunk.len() != missing.len() {
                return Err(PipelineError::TerrainLookup(
                    "elevation provider returned unexpected sample count".to_string(),
                ));
            }

            for (slot, value) in missing.iter().zip(chunk) {
                let value = if value.is_finite() { value } else { 0.0 };
                results[*slot] = value;
                let (lat, lon) = points[*slot];
                self.cache.insert(
                    cache_key(lat, lon),
                    ElevationCacheEntry {
                        fetched_at: Instant::now(),
                        elevation_m: value,
                    },
                );
            }
        }

        Ok(results)
    }

    pub fn prune(&self) {
        prune_cache(&self.cache, ELEVATION_CACHE_MAX_ENTRIES, ELEVATION_CACHE_TTL);
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Gate decision from a set of elevation samples.
pub fn evaluate_samples(samples: &[f64]) -> (bool, String) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in samples {
        if value.is_finite() {
            min = min.min(*value);
            max = max.max(*value);
        }
    }

    if !min.is_finite() || !max.is_finite() {
        return (false, "no usable elevation samples".to_string());
    }

    let variation = max - min;
    if variation < FLAT_VARIATION_M {
        (true, format!("flat_terrain (variation: {variation:.1}m)"))
    } else {
        (false, "complex_terrain".to_string())
    }
}

fn cache_key(lat: f64, lon: f64) -> String {
    format!("{lat:.4}:{lon:.4}")
}

fn join_params(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|value| format!("{value:.6}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn build_provider_url(base: &str, latitudes: &str, longitudes: &str) -> String {
    let separator = if base.contains('?') { "&" } else { "?" };
    format!("{base}{separator}latitude={latitudes}&longitude={longitudes}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_samples_skip() {
        let (skip, reason) = evaluate_samples(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        assert!(skip);
        assert!(reason.starts_with("flat_terrain"));
    }

    #[test]
    fn variation_at_threshold_does_not_skip() {
        let (skip, reason) = evaluate_samples(&[100.0, 300.0, 100.0, 100.0, 100.0]);
        assert!(!skip);
        assert_eq!(reason, "complex_terrain");

        // Exactly 100m of spread is not flat.
        let (skip, _) = evaluate_samples(&[0.0, 100.0]);
        assert!(!skip);
    }

    #[test]
    fn just_under_threshold_skips() {
        let (skip, _) = evaluate_samples(&[10.0, 109.9, 50.0]);
        assert!(skip);
    }

    #[test]
    fn no_usable_samples_fails_closed() {
        let (skip, _) = evaluate_samples(&[f64::NAN, f64::NAN]);
        assert!(!skip);
        let (skip, _) = evaluate_samples(&[]);
        assert!(!skip);
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_closed() {
        let terrain = TerrainService::new("", 1000);
        let (skip, reason) = terrain
            .should_skip_analysis(&GeoPoint::new(0.0, 0.0), 5000.0)
            .await;
        assert!(!skip);
        assert!(reason.contains("not configured"));
    }

    #[test]
    fn provider_url_handles_existing_query() {
        let url = build_provider_url("https://e.test/v1/elev?key=abc", "1.0", "2.0");
        assert!(url.contains("?key=abc&latitude=1.0"));
        let url = build_provider_url("https://e.test/v1/elev", "1.0", "2.0");
        assert!(url.contains("elev?latitude=1.0"));
    }
}
