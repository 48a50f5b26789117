//! Cache-first, retrying price fetcher.
//!
//! ```text
//! fetch(symbol, period, interval)
//!   ├─ cache hit ────────────────────────────► PriceSeries
//!   └─ miss ─► provider.fetch_raw ─┬─ Ok ─► cache.put ─► PriceSeries
//!                                  ├─ Err(retryable) ─► sleep(backoff) ─► retry
//!                                  └─ Err(permanent) / exhausted ─► DataUnavailable
//! ```

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::provider::{PriceProvider, PriceRequest, ProviderError, ProviderId};
use crate::retry::RetryConfig;
use crate::{CoreError, Interval, Period, PriceSeries, Symbol};

/// Fetch resilience layer: one provider, one cache, one retry policy.
pub struct PriceFetcher {
    provider: Arc<dyn PriceProvider>,
    cache: CacheStore,
    retry: RetryConfig,
    rng: Mutex<fastrand::Rng>,
}

impl PriceFetcher {
    /// Fetcher with the default 300 s cache and default retry policy.
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            provider,
            cache: CacheStore::with_default_ttl(),
            retry: RetryConfig::default(),
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Seed the jitter RNG so backoff delays are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(fastrand::Rng::with_seed(seed));
        self
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Return the price series for the key, from cache when still fresh.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataUnavailable`] when the provider fails with a
    /// permanent error or every attempt fails with a transient one.
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries, CoreError> {
        let request = PriceRequest::new(symbol.clone(), period, interval);
        let key = request.cache_key();

        if let Some(series) = self.cache.get(&key).await {
            debug!(request = %request, "cache hit");
            return Ok(series);
        }

        let started = Instant::now();
        let mut attempt = 1;
        loop {
            debug!(request = %request, attempt, provider = %self.provider.id(), "fetching");
            match self.provider.fetch_raw(&request).await {
                Ok(series) => {
                    info!(
                        request = %request,
                        attempt,
                        points = series.len(),
                        latency_ms = started.elapsed().as_millis() as u64,
                        "fetched price series"
                    );
                    self.cache.put(key, series.clone(), None).await;
                    return Ok(series);
                }
                Err(error) if error.retryable() && self.retry.has_attempts_after(attempt) => {
                    let delay = self.next_delay(attempt);
                    warn!(
                        request = %request,
                        attempt,
                        code = error.code(),
                        delay_ms = delay.as_millis() as u64,
                        "transient provider error, backing off: {}",
                        error.message()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(self.unavailable(&request, attempt, error)),
            }
        }
    }

    fn next_delay(&self, attempt: u32) -> std::time::Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.retry.delay_after_attempt(attempt, &mut rng)
    }

    fn unavailable(
        &self,
        request: &PriceRequest,
        attempts: u32,
        source: ProviderError,
    ) -> CoreError {
        warn!(
            request = %request,
            attempts,
            code = source.code(),
            "giving up: {}",
            source.message()
        );
        CoreError::DataUnavailable {
            symbol: request.symbol.to_string(),
            attempts,
            source,
        }
    }
}

impl std::fmt::Debug for PriceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceFetcher")
            .field("provider", &self.provider.id())
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .finish()
    }
}
