//! Behavior-driven tests for the fetch resilience layer
//!
//! These tests verify HOW a fetch behaves around the provider: cache hits,
//! expiry, transient retries and permanent failures. No test touches the
//! network.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use riskcli_core::cache::DEFAULT_TTL;
use riskcli_core::{
    CacheStore, CoreError, HttpClient, HttpError, HttpRequest, HttpResponse, Interval,
    ManualClock, Period, PriceFetcher, ProviderError, ProviderErrorKind, RetryConfig,
    SyntheticProvider, YahooChartProvider,
};
use riskcli_tests::{no_wait, symbol};

/// HTTP transport that replays a fixed script of responses.
#[derive(Debug)]
struct ScriptedHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    calls: Mutex<usize>,
}

impl ScriptedHttpClient {
    fn new(script: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        *self.calls.lock().expect("lock") += 1;
        let next = self
            .script
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::non_retryable("script exhausted")));
        Box::pin(async move { next })
    }
}

const CHART_BODY: &str = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],
    "indicators":{"quote":[{"close":[185.0,184.0,186.0],"volume":[10,20,30]}],
    "adjclose":[{"adjclose":[184.5,183.5,185.5]}]}}],"error":null}}"#;

// =============================================================================
// Fetch: Cache
// =============================================================================

#[tokio::test]
async fn when_same_key_is_fetched_within_ttl_system_calls_provider_once() {
    // Given: A fetcher with a manual clock
    let clock = ManualClock::new();
    let provider = Arc::new(SyntheticProvider::new());
    let fetcher = PriceFetcher::new(provider.clone())
        .with_cache(CacheStore::with_clock(DEFAULT_TTL, Arc::new(clock.clone())))
        .with_retry(no_wait(3));

    // When: The same key is fetched twice, 299 seconds apart
    let first = fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect("series");
    clock.advance(Duration::from_secs(299));
    let second = fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect("series");

    // Then: Both results are identical and the provider saw one call
    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn when_ttl_has_elapsed_system_refetches() {
    let clock = ManualClock::new();
    let provider = Arc::new(SyntheticProvider::new());
    let fetcher = PriceFetcher::new(provider.clone())
        .with_cache(CacheStore::with_clock(DEFAULT_TTL, Arc::new(clock.clone())))
        .with_retry(no_wait(3));

    fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect("series");
    clock.advance(Duration::from_secs(300));
    fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect("series");

    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn when_cache_is_disabled_system_always_calls_provider() {
    let provider = Arc::new(SyntheticProvider::new());
    let fetcher = PriceFetcher::new(provider.clone())
        .with_cache(CacheStore::disabled())
        .with_retry(no_wait(3));

    for _ in 0..3 {
        fetcher
            .fetch(&symbol("MSFT"), Period::OneMonth, Interval::OneDay)
            .await
            .expect("series");
    }

    assert_eq!(provider.calls(), 3);
    assert!(fetcher.cache().is_empty().await);
}

// =============================================================================
// Fetch: Retry
// =============================================================================

#[tokio::test]
async fn when_provider_fails_transiently_twice_system_succeeds_on_third_attempt() {
    // Given: A provider that rate-limits, then is unavailable, then recovers
    let provider = Arc::new(SyntheticProvider::with_failures([
        ProviderError::rate_limited("429 Too Many Requests"),
        ProviderError::unavailable("503 Service Unavailable"),
    ]));
    let fetcher = PriceFetcher::new(provider.clone()).with_retry(no_wait(3));

    // When: The system fetches
    let result = fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await;

    // Then: The third attempt succeeds and is cached
    assert!(result.is_ok());
    assert_eq!(provider.calls(), 3);
    assert_eq!(fetcher.cache().len().await, 1);
}

#[tokio::test]
async fn when_provider_fails_transiently_three_times_system_reports_data_unavailable() {
    // Given: A provider that is rate-limited on every attempt
    let provider = Arc::new(SyntheticProvider::with_failures([
        ProviderError::rate_limited("first"),
        ProviderError::rate_limited("second"),
        ProviderError::rate_limited("third"),
    ]));
    let fetcher = PriceFetcher::new(provider.clone()).with_retry(no_wait(3));

    // When: The system fetches
    let error = fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect_err("retries exhausted");

    // Then: One clear failure carrying the last provider error
    match error {
        CoreError::DataUnavailable {
            symbol,
            attempts,
            source,
        } => {
            assert_eq!(symbol, "AAPL");
            assert_eq!(attempts, 3);
            assert_eq!(source.message(), "third");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.calls(), 3);
    assert!(fetcher.cache().is_empty().await, "failures are never cached");
}

#[tokio::test]
async fn when_provider_fails_permanently_system_does_not_retry() {
    let provider = Arc::new(SyntheticProvider::with_failures([ProviderError::not_found(
        "symbol ZZZZ not found",
    )]));
    let fetcher = PriceFetcher::new(provider.clone()).with_retry(no_wait(3));

    let error = fetcher
        .fetch(&symbol("ZZZZ"), Period::OneYear, Interval::OneDay)
        .await
        .expect_err("permanent failure");

    assert_eq!(error.code(), "core.data_unavailable");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn when_backoff_delays_are_real_system_waits_between_attempts() {
    // Given: A 20ms fixed backoff and one transient failure
    let provider = Arc::new(SyntheticProvider::with_failures([ProviderError::unavailable(
        "503",
    )]));
    let fetcher = PriceFetcher::new(provider.clone())
        .with_retry(RetryConfig::fixed(Duration::from_millis(20), 3));

    // When: The system fetches
    let started = std::time::Instant::now();
    fetcher
        .fetch(&symbol("AAPL"), Period::OneMonth, Interval::OneDay)
        .await
        .expect("series");

    // Then: At least one backoff delay elapsed
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(provider.calls(), 2);
}

// =============================================================================
// Fetch: Yahoo Transport
// =============================================================================

#[tokio::test]
async fn when_yahoo_is_briefly_unavailable_system_recovers_through_retries() {
    // Given: A transport answering 503, then a timeout, then a valid chart
    let client = Arc::new(ScriptedHttpClient::new(vec![
        Ok(HttpResponse::new(503, "")),
        Err(HttpError::new("request timeout")),
        Ok(HttpResponse::ok_json(CHART_BODY)),
    ]));
    let provider = YahooChartProvider::with_http_client(client.clone());
    let fetcher = PriceFetcher::new(Arc::new(provider)).with_retry(no_wait(3));

    // When: The system fetches
    let series = fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect("series");

    // Then: Adjusted closes come through after three transport calls
    assert_eq!(series.prices().collect::<Vec<_>>(), vec![184.5, 183.5, 185.5]);
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn when_yahoo_rejects_the_request_system_fails_without_retrying() {
    let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::new(400, "bad"))]));
    let provider = YahooChartProvider::with_http_client(client.clone());
    let fetcher = PriceFetcher::new(Arc::new(provider)).with_retry(no_wait(3));

    let error = fetcher
        .fetch(&symbol("AAPL"), Period::OneYear, Interval::OneDay)
        .await
        .expect_err("permanent");

    match error {
        CoreError::DataUnavailable { source, .. } => {
            assert_eq!(source.kind(), ProviderErrorKind::InvalidRequest);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(client.calls(), 1);
}
