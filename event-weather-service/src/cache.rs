use chrono::{DateTime, Duration, Utc};
use common::models::{CacheStats, ForecastWindow, WeatherSnapshot};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::clock::Clock;

/// Lifetime of every cache entry
pub const CACHE_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Current,
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: QueryKind,
    pub location: String,
}

impl CacheKey {
    pub fn current(location: &str) -> Self {
        Self {
            kind: QueryKind::Current,
            location: location.to_string(),
        }
    }

    pub fn forecast(location: &str) -> Self {
        Self {
            kind: QueryKind::Forecast,
            location: location.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            QueryKind::Current => "current",
            QueryKind::Forecast => "forecast",
        };
        write!(f, "{}_{}", kind, self.location)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedWeather {
    Current(WeatherSnapshot),
    Forecast(ForecastWindow),
}

struct CacheEntry {
    data: CachedWeather,
    expires_at: DateTime<Utc>,
}

/// Shared weather cache with a fixed TTL and hit/miss accounting.
///
/// Expired entries are dropped lazily by the lookup that finds them. Locks are
/// never held across a provider call: a miss returns immediately and the caller
/// stores the fetched value with a separate `set`.
pub struct WeatherCache {
    cache: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl WeatherCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(CACHE_TTL_SECONDS),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CachedWeather> {
        let now = self.clock.now();
        {
            let cache = self.cache.read().await;
            match cache.get(key) {
                Some(entry) if entry.expires_at > now => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.data.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Entry found but stale; a concurrent set may have refreshed it meanwhile
        let mut cache = self.cache.write().await;
        if let Some(entry) = cache.get(key)
            && entry.expires_at <= now
        {
            cache.remove(key);
            debug!(key = %key, "Evicted expired cache entry");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub async fn set(&self, key: CacheKey, data: CachedWeather) {
        let expires_at = self.clock.now() + self.ttl;
        let mut cache = self.cache.write().await;
        cache.insert(key, CacheEntry { data, expires_at });
    }

    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let cache = self.cache.read().await;
        let mut keys: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(key, _)| key.to_string())
            .collect();
        keys.sort();

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_size: keys.len(),
            keys,
        }
    }

    /// Drop every entry and reset both counters
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn snapshot(location: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            location: location.to_string(),
            country: "GB".to_string(),
            temperature: 18.0,
            feels_like: 17.0,
            humidity: 60,
            pressure: 1012,
            wind_speed: 11.0,
            wind_direction: 200,
            condition: "Clouds".to_string(),
            description: "broken clouds".to_string(),
            precipitation: 0.0,
            visibility: Some(10.0),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    fn setup() -> (Arc<ManualClock>, WeatherCache) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let cache = WeatherCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn get_after_set_is_a_hit() {
        let (_clock, cache) = setup();
        let key = CacheKey::current("London");

        assert!(cache.get(&key).await.is_none());
        cache
            .set(key.clone(), CachedWeather::Current(snapshot("London")))
            .await;

        assert_eq!(
            cache.get(&key).await,
            Some(CachedWeather::Current(snapshot("London")))
        );
        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.keys, vec!["current_London".to_string()]);
    }

    #[tokio::test]
    async fn entry_expires_after_ttl_and_is_evicted() {
        let (clock, cache) = setup();
        let key = CacheKey::forecast("Paris");
        cache
            .set(key.clone(), CachedWeather::Current(snapshot("Paris")))
            .await;

        clock.advance(Duration::seconds(CACHE_TTL_SECONDS - 1));
        assert!(cache.get(&key).await.is_some());

        clock.advance(Duration::seconds(1));
        assert!(cache.get(&key).await.is_none());

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(stats.cache_size, 0);
        assert!(cache.cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn current_and_forecast_keys_are_distinct() {
        let (_clock, cache) = setup();
        cache
            .set(
                CacheKey::current("Oslo"),
                CachedWeather::Current(snapshot("Oslo")),
            )
            .await;

        assert!(cache.get(&CacheKey::forecast("Oslo")).await.is_none());
        assert!(cache.get(&CacheKey::current("oslo")).await.is_none());
    }

    #[tokio::test]
    async fn clear_resets_counters_and_keys() {
        let (_clock, cache) = setup();
        let key = CacheKey::current("Rome");
        cache
            .set(key.clone(), CachedWeather::Current(snapshot("Rome")))
            .await;
        cache.get(&key).await;
        cache.get(&CacheKey::current("Milan")).await;

        cache.clear().await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.cache_size, 0);
        assert!(stats.keys.is_empty());
    }

    #[tokio::test]
    async fn stats_skip_expired_entries_and_sort_keys() {
        let (clock, cache) = setup();
        cache
            .set(
                CacheKey::forecast("Zurich"),
                CachedWeather::Current(snapshot("Zurich")),
            )
            .await;
        clock.advance(Duration::minutes(30));
        cache
            .set(
                CacheKey::current("Bern"),
                CachedWeather::Current(snapshot("Bern")),
            )
            .await;
        cache
            .set(
                CacheKey::current("Basel"),
                CachedWeather::Current(snapshot("Basel")),
            )
            .await;

        let stats = cache.stats().await;
        assert_eq!(
            stats.keys,
            vec!["current_Basel", "current_Bern", "forecast_Zurich"]
        );

        clock.advance(Duration::minutes(31));
        let stats = cache.stats().await;
        assert_eq!(stats.keys, vec!["current_Basel", "current_Bern"]);
        assert_eq!(stats.cache_size, 2);
    }
}
