//! Runtime tuning knobs with environment overrides.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `RISKCLI_CACHE_TTL_SECS` | 300 | price cache TTL, `0` disables caching |
//! | `RISKCLI_MAX_ATTEMPTS` | 3 | provider attempts per fetch |
//! | `RISKCLI_BACKOFF_BASE_MS` | 500 | first backoff delay |
//! | `RISKCLI_HTTP_TIMEOUT_MS` | 10000 | per-request HTTP timeout |

use std::time::Duration;

use crate::cache::{CacheStore, DEFAULT_TTL};
use crate::retry::{Backoff, RetryConfig};
use crate::ValidationError;

pub const ENV_CACHE_TTL_SECS: &str = "RISKCLI_CACHE_TTL_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "RISKCLI_MAX_ATTEMPTS";
pub const ENV_BACKOFF_BASE_MS: &str = "RISKCLI_BACKOFF_BASE_MS";
pub const ENV_HTTP_TIMEOUT_MS: &str = "RISKCLI_HTTP_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub cache_ttl: Duration,
    pub retry: RetryConfig,
    pub http_timeout_ms: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            retry: RetryConfig::default(),
            http_timeout_ms: 10_000,
        }
    }
}

impl RiskConfig {
    /// Defaults overridden by any `RISKCLI_*` variables that are set.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RiskConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = read_u64(&lookup, ENV_CACHE_TTL_SECS)? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(attempts) = read_u64(&lookup, ENV_MAX_ATTEMPTS)? {
            config.retry.max_attempts = u32::try_from(attempts).unwrap_or(u32::MAX).max(1);
        }
        if let Some(base_ms) = read_u64(&lookup, ENV_BACKOFF_BASE_MS)? {
            if let Backoff::Exponential { base, .. } = &mut config.retry.backoff {
                *base = Duration::from_millis(base_ms);
            }
        }
        if let Some(timeout_ms) = read_u64(&lookup, ENV_HTTP_TIMEOUT_MS)? {
            config.http_timeout_ms = timeout_ms;
        }

        Ok(config)
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_ttl = Duration::ZERO;
        self
    }

    pub fn cache_store(&self) -> CacheStore {
        if self.cache_ttl.is_zero() {
            CacheStore::disabled()
        } else {
            CacheStore::new(self.cache_ttl)
        }
    }
}

fn read_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidConfigValue { key, value: raw })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{CacheKey, Interval, Period, PricePoint, PriceSeries, Symbol, UtcDateTime};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_environment_keeps_defaults() {
        let config = RiskConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, RiskConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn overrides_are_applied() {
        let config = RiskConfig::from_lookup(lookup(&[
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_MAX_ATTEMPTS, "5"),
            (ENV_BACKOFF_BASE_MS, "100"),
            (ENV_HTTP_TIMEOUT_MS, "2500"),
        ]))
        .expect("config");

        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.window_after_attempt(1).min, Duration::from_millis(100));
        assert_eq!(config.http_timeout_ms, 2_500);
    }

    #[test]
    fn garbage_value_is_rejected() {
        let error = RiskConfig::from_lookup(lookup(&[(ENV_MAX_ATTEMPTS, "three")]))
            .expect_err("invalid");
        assert_eq!(
            error,
            ValidationError::InvalidConfigValue {
                key: ENV_MAX_ATTEMPTS,
                value: String::from("three"),
            }
        );
    }

    #[tokio::test]
    async fn largest_ttl_is_accepted_and_caches() {
        let max = u64::MAX.to_string();
        let config = RiskConfig::from_lookup(lookup(&[(ENV_CACHE_TTL_SECS, max.as_str())]))
            .expect("config");
        let store = config.cache_store();
        let symbol = Symbol::parse("AAPL").expect("valid");
        let key = CacheKey::new(symbol.clone(), Period::OneYear, Interval::OneDay);
        let ts = UtcDateTime::from_unix_timestamp(0).expect("valid");
        let series = PriceSeries::new(
            symbol,
            Period::OneYear,
            Interval::OneDay,
            vec![PricePoint::new(ts, 100.0, None).expect("valid")],
        )
        .expect("valid");

        store.put(key.clone(), series.clone(), None).await;

        assert_eq!(store.get(&key).await, Some(series));
    }

    #[tokio::test]
    async fn zero_ttl_disables_the_cache() {
        let config = RiskConfig::default().without_cache();
        assert!(config.cache_store().is_disabled().await);
    }
}
