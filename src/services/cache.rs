use crate::types::Timeframe;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Cache key for a provider's candle series.
pub fn candle_key(symbol: &str, source: &str, timeframe: Timeframe) -> String {
    format!("{}:{}:{}", symbol.to_lowercase(), source, timeframe.as_str())
}

/// A thread-safe cache with TTL support.
pub struct Cache<V> {
    data: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> Cache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            default_ttl,
        }
    }

    /// Get a fresh value; expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Set a value with the default TTL.
    pub fn set(&self, key: String, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: String, value: V, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every expired entry.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Entry count, expired entries included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_key() {
        assert_eq!(candle_key("BTC", "binance", Timeframe::OneHour), "btc:binance:1h");
    }

    #[test]
    fn test_cache_basic() {
        let cache = Cache::new(Duration::from_secs(60));
        cache.set("btc:binance:1h".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("btc:binance:1h"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("eth:binance:1h"), None);
    }

    #[test]
    fn test_cache_expiration() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.set("key".to_string(), 1u32);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_cleanup_keeps_fresh() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.set("stale".to_string(), 1u32);
        cache.set_with_ttl("fresh".to_string(), 2u32, Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(20));
        cache.cleanup();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(2));
    }
}
