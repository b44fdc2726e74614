//! Bounded in-memory cache for directed distance lookups.
//!
//! Explicitly owned and injectable (shared via `Arc`), never a module
//! level singleton, so tests can seed or reset it. Eviction is oldest
//! first once the entry count passes the capacity.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tracing::trace;

use crate::model::{Coordinates, DistanceRecord};

/// Default entry ceiling; ~10k records bounds memory to a few MB.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, DistanceRecord>,
    order: VecDeque<String>,
}

/// Bounded FIFO cache keyed by rounded coordinate pairs.
///
/// Two concurrent misses for the same key may both reach the external
/// source; that is accepted (the lookup is idempotent) and the second
/// insert simply overwrites the first without double-counting.
#[derive(Debug)]
pub struct DistanceCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl DistanceCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Directed key: origin and destination rounded to 6 decimals.
    pub fn key(from: Coordinates, to: Coordinates) -> String {
        format!("{}|{}", from.key(), to.key())
    }

    pub fn get(&self, key: &str) -> Option<DistanceRecord> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.map.get(key).copied()
    }

    pub fn insert(&self, key: String, record: DistanceRecord) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.map.insert(key.clone(), record).is_none() {
            inner.order.push_back(key);
        }
        while inner.map.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.map.remove(&oldest);
            trace!(key = %oldest, "evicted oldest cache entry");
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DistanceSource;

    fn record(km: f64) -> DistanceRecord {
        DistanceRecord {
            distance_km: km,
            duration_min: km * 2.0,
            source: DistanceSource::Provider,
        }
    }

    #[test]
    fn get_returns_inserted() {
        let cache = DistanceCache::with_capacity(4);
        cache.insert("a|b".to_string(), record(1.0));
        assert_eq!(cache.get("a|b").unwrap().distance_km, 1.0);
        assert!(cache.get("b|a").is_none());
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let cache = DistanceCache::with_capacity(2);
        cache.insert("k1".to_string(), record(1.0));
        cache.insert("k2".to_string(), record(2.0));
        cache.insert("k3".to_string(), record(3.0));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k3").is_some());
    }

    #[test]
    fn overwrite_does_not_grow_order() {
        let cache = DistanceCache::with_capacity(2);
        cache.insert("k1".to_string(), record(1.0));
        cache.insert("k1".to_string(), record(9.0));
        cache.insert("k2".to_string(), record(2.0));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("k1").unwrap().distance_km, 9.0);
    }

    #[test]
    fn key_is_directed() {
        let a = Coordinates { lat: 1.0, lng: 2.0 };
        let b = Coordinates { lat: 3.0, lng: 4.0 };
        assert_ne!(DistanceCache::key(a, b), DistanceCache::key(b, a));
    }
}
