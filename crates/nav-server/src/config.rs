//! Server configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Vision capability endpoint; empty key disables the AI path entirely.
    pub vision_api_url: String,
    pub vision_api_key: String,
    pub vision_model: String,
    /// Per-call budget for the real-time frame path (sub-second target).
    pub frame_timeout_ms: u64,
    pub horizon_timeout_ms: u64,
    pub phrase_timeout_ms: u64,
    pub route_timeout_ms: u64,
    /// Elevation provider; empty URL makes the terrain gate fail closed.
    pub elevation_url: String,
    pub elevation_timeout_ms: u64,
    pub cache_ttl_s: u64,
    pub cache_max_entries: usize,
    pub nearby_radius_m: f64,
    pub terrain_gate_radius_m: f64,
    pub waypoint_seed_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("NAV_PORT", 3000),
            vision_api_url: env::var("NAV_VISION_URL")
                .unwrap_or_else(|_| "http://localhost:8600".to_string()),
            vision_api_key: env::var("NAV_VISION_API_KEY").unwrap_or_default(),
            vision_model: env::var("NAV_VISION_MODEL")
                .unwrap_or_else(|_| "vista-flash".to_string()),
            frame_timeout_ms: parse_env("NAV_FRAME_TIMEOUT_MS", 900),
            horizon_timeout_ms: parse_env("NAV_HORIZON_TIMEOUT_MS", 2500),
            phrase_timeout_ms: parse_env("NAV_PHRASE_TIMEOUT_MS", 900),
            route_timeout_ms: parse_env("NAV_ROUTE_TIMEOUT_MS", 5000),
            elevation_url: env::var("NAV_ELEVATION_URL").unwrap_or_default(),
            elevation_timeout_ms: parse_env("NAV_ELEVATION_TIMEOUT_MS", 2000),
            cache_ttl_s: parse_env("NAV_CACHE_TTL_S", 30),
            cache_max_entries: parse_env("NAV_CACHE_MAX_ENTRIES", 10_000),
            nearby_radius_m: parse_env("NAV_NEARBY_RADIUS_M", 500.0),
            terrain_gate_radius_m: parse_env("NAV_TERRAIN_GATE_RADIUS_M", 5000.0),
            waypoint_seed_path: env::var("NAV_WAYPOINT_SEED").ok(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl Config {
    /// Offline test config: no vision key, no elevation provider.
    pub(crate) fn for_tests() -> Self {
        Self {
            server_port: 0,
            vision_api_url: String::new(),
            vision_api_key: String::new(),
            vision_model: "vista-flash".to_string(),
            frame_timeout_ms: 900,
            horizon_timeout_ms: 2500,
            phrase_timeout_ms: 900,
            route_timeout_ms: 5000,
            elevation_url: String::new(),
            elevation_timeout_ms: 2000,
            cache_ttl_s: 30,
            cache_max_entries: 1000,
            nearby_radius_m: 500.0,
            terrain_gate_radius_m: 5000.0,
            waypoint_seed_path: None,
        }
    }
}
