use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Store for downloaded originals and derived crops.
///
/// Implementations synchronize internally; every call is best-effort and a
/// miss only means the caller recomputes.
pub trait ImageCache: Send + Sync {
    fn get_original(&self, key: &str) -> Option<Arc<RgbaImage>>;
    fn store_original(&self, key: &str, image: Arc<RgbaImage>);
    fn get_scaled(&self, key: &str, scale: f64) -> Option<Arc<RgbaImage>>;
    fn store_scaled(&self, key: &str, scale: f64, image: Arc<RgbaImage>);
    fn status(&self) -> CacheStatus;
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatus {
    pub original_capacity: usize,
    pub original_count: usize,
    pub scaled_capacity: usize,
    pub scaled_count: usize,
    pub original_keys: Vec<String>,
    pub scaled_keys: Vec<String>,
}

/// One capacity-bounded tier, least recently used first.
struct Tier<K> {
    capacity: usize,
    entries: VecDeque<(K, Arc<RgbaImage>)>,
}

impl<K: PartialEq> Tier<K> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    fn get(&mut self, key: &K) -> Option<Arc<RgbaImage>> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos)?;
        let image = entry.1.clone();
        self.entries.push_back(entry);
        Some(image)
    }

    /// Insert, returning how many entries were evicted
    fn store(&mut self, key: K, image: Arc<RgbaImage>) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push_back((key, image));

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }
}

type ScaledKey = (String, u64);

/// Two-tier in-memory cache: originals keyed by source key, derived crops keyed
/// by (source key, scale). Each tier evicts its least recently used entry when full.
pub struct TieredCache {
    originals: Mutex<Tier<String>>,
    scaled: Mutex<Tier<ScaledKey>>,
}

impl TieredCache {
    pub fn new(original_capacity: usize, scaled_capacity: usize) -> Self {
        Self {
            originals: Mutex::new(Tier::new(original_capacity)),
            scaled: Mutex::new(Tier::new(scaled_capacity)),
        }
    }
}

fn scaled_key(key: &str, scale: f64) -> ScaledKey {
    (key.to_string(), scale.to_bits())
}

impl ImageCache for TieredCache {
    fn get_original(&self, key: &str) -> Option<Arc<RgbaImage>> {
        let Ok(mut tier) = self.originals.lock() else {
            return None;
        };
        tier.get(&key.to_string())
    }

    fn store_original(&self, key: &str, image: Arc<RgbaImage>) {
        if let Ok(mut tier) = self.originals.lock() {
            let evicted = tier.store(key.to_string(), image);
            if evicted > 0 {
                debug!("Original cache full, evicted {} entries", evicted);
            }
        }
    }

    fn get_scaled(&self, key: &str, scale: f64) -> Option<Arc<RgbaImage>> {
        let Ok(mut tier) = self.scaled.lock() else {
            return None;
        };
        tier.get(&scaled_key(key, scale))
    }

    fn store_scaled(&self, key: &str, scale: f64, image: Arc<RgbaImage>) {
        if let Ok(mut tier) = self.scaled.lock() {
            let evicted = tier.store(scaled_key(key, scale), image);
            if evicted > 0 {
                debug!("Scaled cache full, evicted {} entries", evicted);
            }
        }
    }

    fn status(&self) -> CacheStatus {
        let mut status = CacheStatus::default();
        if let Ok(tier) = self.originals.lock() {
            status.original_capacity = tier.capacity;
            status.original_count = tier.entries.len();
            status.original_keys = tier.entries.iter().map(|(k, _)| k.clone()).collect();
        }
        if let Ok(tier) = self.scaled.lock() {
            status.scaled_capacity = tier.capacity;
            status.scaled_count = tier.entries.len();
            status.scaled_keys = tier
                .entries
                .iter()
                .map(|((k, bits), _)| format!("{}@{}", k, f64::from_bits(*bits)))
                .collect();
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(v: u8) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(2, 2, image::Rgba([v, v, v, 255])))
    }

    #[test]
    fn test_original_roundtrip_and_miss() {
        let cache = TieredCache::new(2, 2);
        assert!(cache.get_original("a").is_none());
        cache.store_original("a", img(1));
        assert_eq!(cache.get_original("a").unwrap().get_pixel(0, 0)[0], 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = TieredCache::new(2, 2);
        cache.store_original("a", img(1));
        cache.store_original("b", img(2));
        // Touch "a" so "b" becomes the eviction candidate
        cache.get_original("a");
        cache.store_original("c", img(3));

        assert!(cache.get_original("a").is_some());
        assert!(cache.get_original("b").is_none());
        assert!(cache.get_original("c").is_some());
        assert_eq!(cache.status().original_count, 2);
    }

    #[test]
    fn test_scaled_keyed_by_scale() {
        let cache = TieredCache::new(1, 4);
        cache.store_scaled("u", 48.0, img(5));
        cache.store_scaled("u", 0.5, img(6));
        assert_eq!(cache.get_scaled("u", 48.0).unwrap().get_pixel(0, 0)[0], 5);
        assert_eq!(cache.get_scaled("u", 0.5).unwrap().get_pixel(0, 0)[0], 6);
        assert!(cache.get_scaled("u", 1.0).is_none());

        let status = cache.status();
        assert_eq!(status.scaled_count, 2);
        assert!(status.scaled_keys.contains(&"u@48".to_string()));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = TieredCache::new(0, 0);
        cache.store_original("a", img(1));
        assert!(cache.get_original("a").is_none());
        assert_eq!(cache.status().original_count, 0);
    }
}
