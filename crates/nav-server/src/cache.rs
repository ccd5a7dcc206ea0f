//! Quantized result cache for navigation instructions.
//!
//! Keys absorb GPS/compass jitter: location rounds to 4 decimal places
//! (~11 m buckets) and heading to 15° buckets. Entries are immutable once
//! written, overwritten wholesale, and invalidated purely by TTL.

use dashmap::DashMap;
use nav_core::models::{normalize_heading, NavigationInstruction};
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait CacheEntry {
    fn fetched_at(&self) -> Instant;
}

/// Drop entries older than `max_age`, then oldest-first down to `max_entries`.
pub fn prune_cache<K, V>(cache: &DashMap<K, V>, max_entries: usize, max_age: Duration)
where
    K: Clone + Eq + Hash,
    V: CacheEntry,
{
    let now = Instant::now();
    let mut entries: Vec<(K, Instant)> = cache
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().fetched_at()))
        .collect();

    for (key, fetched_at) in &entries {
        if now.duration_since(*fetched_at) > max_age {
            cache.remove(key);
        }
    }

    if cache.len() <= max_entries {
        return;
    }

    entries.sort_by_key(|(_, fetched_at)| *fetched_at);
    for (key, _) in entries {
        if cache.len() <= max_entries {
            break;
        }
        cache.remove(&key);
    }
}

/// Quantized (location, heading) cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e4: i64,
    lon_e4: i64,
    heading_bucket: u16,
}

impl CacheKey {
    pub fn quantize(latitude: f64, longitude: f64, heading_deg: f64) -> Self {
        let heading = normalize_heading(heading_deg);
        Self {
            lat_e4: (latitude * 10_000.0).round() as i64,
            lon_e4: (longitude * 10_000.0).round() as i64,
            heading_bucket: (((heading / 15.0).round() * 15.0) as u16) % 360,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredInstruction {
    instruction: NavigationInstruction,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry for StoredInstruction {
    fn fetched_at(&self) -> Instant {
        self.stored_at
    }
}

/// Concurrency-safe instruction cache. Best-effort only: concurrent misses
/// for the same key may both trigger fresh computation.
pub struct ResultCache {
    entries: DashMap<CacheKey, StoredInstruction>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the stored instruction, treating expired entries as misses
    /// and removing them on the way out.
    pub fn get(&self, key: &CacheKey) -> Option<NavigationInstruction> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.stored_at.elapsed() <= entry.ttl {
                    return Some(entry.instruction.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    /// Store unconditionally, overwriting any prior entry.
    pub fn put(&self, key: CacheKey, instruction: NavigationInstruction, ttl: Duration) {
        self.entries.insert(
            key,
            StoredInstruction {
                instruction,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn prune(&self, max_entries: usize, max_age: Duration) {
        prune_cache(&self.entries, max_entries, max_age);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_core::models::Direction;

    fn instruction(message: &str) -> NavigationInstruction {
        NavigationInstruction {
            direction: Direction::Forward,
            distance_meters: 100.0,
            message: message.to_string(),
            confidence: 0.8,
        }
    }

    #[test]
    fn jittered_requests_share_a_key() {
        // < ~0.00005° of position jitter and < 15° of heading jitter within
        // one bucket must land on the same key.
        let a = CacheKey::quantize(-0.09170, 34.76800, 90.0);
        let b = CacheKey::quantize(-0.09172, 34.76802, 95.0);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_buckets_get_distinct_keys() {
        let a = CacheKey::quantize(0.0, 0.0, 0.0);
        let far = CacheKey::quantize(0.01, 0.0, 0.0);
        let turned = CacheKey::quantize(0.0, 0.0, 120.0);
        assert_ne!(a, far);
        assert_ne!(a, turned);
    }

    #[test]
    fn heading_360_wraps_to_north_bucket() {
        assert_eq!(
            CacheKey::quantize(1.0, 1.0, 360.0),
            CacheKey::quantize(1.0, 1.0, 0.0)
        );
        // 355° rounds up to the 360 bucket, which is north again.
        assert_eq!(
            CacheKey::quantize(1.0, 1.0, 355.0),
            CacheKey::quantize(1.0, 1.0, 2.0)
        );
    }

    #[test]
    fn get_put_and_overwrite() {
        let cache = ResultCache::new();
        let key = CacheKey::quantize(1.0, 2.0, 30.0);
        assert!(cache.get(&key).is_none());

        cache.put(key, instruction("first"), Duration::from_secs(60));
        assert_eq!(cache.get(&key).unwrap().message, "first");

        cache.put(key, instruction("second"), Duration::from_secs(60));
        assert_eq!(cache.get(&key).unwrap().message, "second");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = ResultCache::new();
        let key = CacheKey::quantize(1.0, 2.0, 30.0);
        cache.put(key, instruction("stale"), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn prune_enforces_entry_budget() {
        let cache = ResultCache::new();
        for i in 0..20 {
            let key = CacheKey::quantize(i as f64 * 0.01, 0.0, 0.0);
            cache.put(key, instruction("x"), Duration::from_secs(60));
        }
        cache.prune(5, Duration::from_secs(60));
        assert!(cache.len() <= 5);
    }
}
