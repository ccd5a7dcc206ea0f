//! Shared application state.

use crate::cache::ResultCache;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::terrain::TerrainService;
use crate::waypoints::WaypointStore;
use nav_vision::VisionClient;

/// Application state - thread-safe stores shared by every request.
///
/// The vision client is optional: without an API key the server runs in
/// geometry-only mode and every frame takes the fallback path.
pub struct AppState {
    pub config: Config,
    pub vision: Option<VisionClient>,
    pub terrain: TerrainService,
    pub waypoints: WaypointStore,
    pub cache: ResultCache,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let vision = if config.vision_api_key.trim().is_empty() {
            tracing::warn!("vision API key not configured; running geometry-only");
            None
        } else {
            Some(VisionClient::new(
                config.vision_api_url.clone(),
                config.vision_api_key.clone(),
                config.vision_model.clone(),
            ))
        };

        let terrain = TerrainService::new(config.elevation_url.clone(), config.elevation_timeout_ms);

        Self {
            vision,
            terrain,
            waypoints: WaypointStore::new(),
            cache: ResultCache::new(),
            metrics: Metrics::new(),
            config,
        }
    }
}
