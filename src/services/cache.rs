// src/services/cache.rs
// DOCUMENTATION: In-memory TTL cache for nearby-note queries
// PURPOSE: Serve repeated map viewport requests without hitting PostGIS

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe cache of serialized nearby-query results
/// DOCUMENTATION: Any note write clears it entirely
pub struct NotesCache {
    store: Arc<RwLock<HashMap<String, CacheEntry<String>>>>,
    default_ttl: Duration,
}

impl NotesCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Key for a nearby query; coordinates rounded to ~10 m
    pub fn nearby_key(lat: f64, lng: f64, radius_m: f64) -> String {
        format!(
            "nearby:{}:{}:{}",
            (lat * 10000.0).round() as i64,
            (lng * 10000.0).round() as i64,
            radius_m.round() as i64
        )
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;

        match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                log::debug!("Cache HIT for key: {}", key);
                Some(entry.data.clone())
            }
            Some(_) => {
                log::debug!("Cache EXPIRED for key: {}", key);
                None
            }
            None => {
                log::debug!("Cache MISS for key: {}", key);
                None
            }
        }
    }

    pub async fn set(&self, key: String, value: String) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: String, value: String, ttl: Duration) {
        let mut store = self.store.write().await;
        log::debug!("Cache SET for key: {} (TTL: {}s)", key, ttl.as_secs());
        store.insert(key, CacheEntry::new(value, ttl));
    }

    /// Drop expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }

    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let count = store.len();
        store.clear();
        if count > 0 {
            log::debug!("Cache cleared: {} entries removed", count);
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Start background cleanup task
pub fn start_cleanup_task(cache: Arc<NotesCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = NotesCache::new(60);
        cache.set("k".to_string(), "[]".to_string()).await;
        assert_eq!(cache.get("k").await, Some("[]".to_string()));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = NotesCache::new(60);
        cache
            .set_with_ttl("k".to_string(), "v".to_string(), Duration::from_millis(50))
            .await;
        assert!(cache.get("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[test]
    fn test_nearby_key_rounds_coordinates() {
        let a = NotesCache::nearby_key(40.41681, -3.70381, 1000.0);
        let b = NotesCache::nearby_key(40.41683, -3.70379, 1000.0);
        let c = NotesCache::nearby_key(40.4178, -3.7038, 1000.0);
        let d = NotesCache::nearby_key(40.41681, -3.70381, 2000.0);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a, "nearby:404168:-37038:1000");
    }

    #[tokio::test]
    async fn test_cleanup_and_clear() {
        let cache = NotesCache::new(60);
        cache
            .set_with_ttl("old".to_string(), "v".to_string(), Duration::from_millis(10))
            .await;
        cache.set("fresh".to_string(), "v".to_string()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.cleanup().await;

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.active_entries, 1);

        cache.clear().await;
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let cache = NotesCache::new(60);
        tokio_test::block_on(cache.set("k".to_string(), "v".to_string()));
        let stats = tokio_test::block_on(cache.stats());

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalEntries"], 1);
        assert_eq!(value["activeEntries"], 1);
        assert_eq!(value["expiredEntries"], 0);
    }
}
