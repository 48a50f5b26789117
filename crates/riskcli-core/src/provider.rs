//! Price provider trait and request/error types.
//!
//! This module defines the adapter contract (`PriceProvider`) implemented by
//! the Yahoo chart adapter and by the deterministic synthetic adapter used in
//! tests and `--mock` runs.
//!
//! # Error classes
//!
//! | Kind | Retryable | Typical cause |
//! |------|-----------|---------------|
//! | [`ProviderErrorKind::RateLimited`] | yes | HTTP 429 |
//! | [`ProviderErrorKind::Unavailable`] | yes | 5xx, timeout, connection reset |
//! | [`ProviderErrorKind::NotFound`] | no | unknown symbol |
//! | [`ProviderErrorKind::InvalidRequest`] | no | other 4xx |
//! | [`ProviderErrorKind::InvalidResponse`] | no | malformed payload |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CacheKey, Interval, Period, PriceSeries, Symbol};

/// Provider identifier used in logs and report metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Yahoo,
    Synthetic,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Synthetic => "synthetic",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    RateLimited,
    Unavailable,
    NotFound,
    InvalidRequest,
    InvalidResponse,
}

/// Structured provider error; `retryable` decides whether the fetcher tries again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::InvalidRequest => "provider.invalid_request",
            ProviderErrorKind::InvalidResponse => "provider.invalid_response",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Request payload for a price history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceRequest {
    pub symbol: Symbol,
    pub period: Period,
    pub interval: Interval,
}

impl PriceRequest {
    pub fn new(symbol: Symbol, period: Period, interval: Interval) -> Self {
        Self {
            symbol,
            period,
            interval,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.symbol.clone(), self.period, self.interval)
    }
}

impl Display for PriceRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} @ {}", self.symbol, self.period, self.interval)
    }
}

/// Source adapter contract for adjusted price history.
///
/// Implementations make exactly one upstream attempt per call; retries and
/// caching belong to [`crate::PriceFetcher`].
pub trait PriceProvider: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the adjusted price series for `req`.
    ///
    /// # Errors
    ///
    /// Returns a retryable [`ProviderError`] for rate limiting and temporary
    /// outages, and a non-retryable one for unknown symbols or bad payloads.
    fn fetch_raw<'a>(
        &'a self,
        req: &'a PriceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_retryable() {
        assert!(ProviderError::rate_limited("slow down").retryable());
        assert!(ProviderError::unavailable("503").retryable());
        assert!(!ProviderError::not_found("no such ticker").retryable());
        assert!(!ProviderError::invalid_request("400").retryable());
        assert!(!ProviderError::invalid_response("bad json").retryable());
    }

    #[test]
    fn display_includes_code() {
        let error = ProviderError::not_found("symbol ZZZZ not found");
        assert_eq!(error.to_string(), "symbol ZZZZ not found (provider.not_found)");
    }
}
