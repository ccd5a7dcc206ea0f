//! Periodic pruning for the result and elevation caches.

use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run_cache_prune_loop(state: Arc<AppState>) {
    let max_age = Duration::from_secs(state.config.cache_ttl_s.max(1) * 2);
    let mut interval = tokio::time::interval(PRUNE_INTERVAL);

    loop {
        interval.tick().await;
        state.cache.prune(state.config.cache_max_entries, max_age);
        state.terrain.prune();
        tracing::debug!(
            "cache prune: {} instructions, {} elevation tiles",
            state.cache.len(),
            state.terrain.cache_len()
        );
    }
}
