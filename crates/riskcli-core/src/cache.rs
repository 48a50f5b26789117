//! In-memory, time-bounded cache for fetched price series.
//!
//! The store is an owned value handed to the fetcher, not a global. Its
//! clock is injectable so expiry can be driven deterministically in tests.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::{Interval, Period, PriceSeries, Symbol};

/// Default lifetime of a cached series.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic expiry tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exact identity of a fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub period: Period,
    pub interval: Interval,
}

impl CacheKey {
    pub fn new(symbol: Symbol, period: Period, interval: Interval) -> Self {
        Self {
            symbol,
            period,
            interval,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: PriceSeries,
    // `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<CacheKey, CacheEntry>,
    default_ttl: Duration,
}

impl CacheInner {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn get(&self, key: &CacheKey, now: Instant) -> Option<PriceSeries> {
        self.map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.series.clone())
    }

    fn put(
        &mut self,
        key: CacheKey,
        series: PriceSeries,
        now: Instant,
        ttl_override: Option<Duration>,
    ) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        let expires_at = now.checked_add(ttl);
        self.map.insert(key, CacheEntry { series, expires_at });
    }

    fn clear_expired(&mut self, now: Instant) {
        self.map.retain(|_, entry| entry.is_live(now));
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Thread-safe read-through cache of price series keyed by request.
///
/// Writes take the lock exclusively, so overlapping fetches for the same key
/// can at worst both hit the provider; neither update is lost.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Create a new cache store with a default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Create a cache store that reads time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(default_ttl))),
            clock,
        }
    }

    /// Create a cache store with the default 5 minute TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Create a disabled cache: every lookup misses and writes are dropped.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Get the cached series for `key` if it exists and hasn't expired.
    pub async fn get(&self, key: &CacheKey) -> Option<PriceSeries> {
        let now = self.clock.now();
        let store = self.inner.read().await;
        store.get(key, now)
    }

    /// Store `series` under `key` with a fresh TTL, dropping any expired
    /// entries on the way.
    ///
    /// If the cache is disabled (TTL is ZERO), this is a no-op.
    pub async fn put(&self, key: CacheKey, series: PriceSeries, ttl_override: Option<Duration>) {
        let now = self.clock.now();
        let mut store = self.inner.write().await;

        if store.default_ttl == Duration::ZERO {
            return;
        }

        store.clear_expired(now);
        store.put(key, series, now, ttl_override);
    }

    /// Remove expired entries from the cache.
    pub async fn clear_expired(&self) {
        let now = self.clock.now();
        let mut store = self.inner.write().await;
        store.clear_expired(now);
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.clear();
    }

    /// Number of entries held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Check if the cache is disabled (TTL is ZERO).
    pub async fn is_disabled(&self) -> bool {
        let store = self.inner.read().await;
        store.default_ttl == Duration::ZERO
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}
