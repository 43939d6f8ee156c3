//! TTL cache of collected market data

use analyst_core::{Market, MarketData};
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key: upper-cased symbol plus market
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub market: Market,
}

impl CacheKey {
    pub fn new(symbol: &str, market: Market) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            market,
        }
    }
}

/// Thread-safe cache shared by every job of one orchestrator
///
/// A zero TTL disables caching.
#[derive(Clone)]
pub struct MarketDataCache {
    cache: Arc<RwLock<TimedCache<CacheKey, MarketData>>>,
    enabled: bool,
}

impl MarketDataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            enabled: !ttl.is_zero(),
        }
    }

    pub async fn get(&self, symbol: &str, market: Market) -> Option<MarketData> {
        if !self.enabled {
            return None;
        }
        let key = CacheKey::new(symbol, market);
        let mut cache = self.cache.write().await;
        let hit = cache.cache_get(&key).cloned();
        tracing::debug!(
            "Market data cache {} for {:?}",
            if hit.is_some() { "hit" } else { "miss" },
            key
        );
        hit
    }

    pub async fn insert(&self, symbol: &str, market: Market, data: MarketData) {
        if !self.enabled {
            return;
        }
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(CacheKey::new(symbol, market), data);
    }

    pub async fn invalidate(&self, symbol: &str, market: Market) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(&CacheKey::new(symbol, market));
    }

    pub async fn clear(&self) {
        self.cache.write().await.cache_clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MarketDataCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
