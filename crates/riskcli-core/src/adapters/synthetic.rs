use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::provider::{PriceProvider, PriceRequest, ProviderError, ProviderId};
use crate::{PricePoint, PriceSeries, Symbol, UtcDateTime};

/// Last synthetic bar is stamped 2024-12-31T00:00:00Z so output never drifts.
const ANCHOR_UNIX: i64 = 1_735_603_200;
const MAX_POINTS: usize = 20_000;
const MARKET_DRIFT: f64 = 0.0004;
const MARKET_VOL: f64 = 0.01;
const IDIOSYNCRATIC_VOL: f64 = 0.008;

/// Deterministic, network-free price provider.
///
/// Every symbol shares a market factor, loaded by a per-symbol beta, plus
/// its own noise; index tickers (`^...`) are the pure market factor. The same
/// request always yields the same series.
///
/// Failures can be scripted with [`SyntheticProvider::with_failures`]: each
/// call pops the next queued error until the queue is empty.
#[derive(Debug, Default)]
pub struct SyntheticProvider {
    failures: Mutex<VecDeque<ProviderError>>,
    calls: AtomicUsize,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: impl IntoIterator<Item = ProviderError>) -> Self {
        Self {
            failures: Mutex::new(failures.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `fetch_raw` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_failure(&self) -> Option<ProviderError> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    /// Build the series for `req` without touching the call counter.
    pub fn generate(req: &PriceRequest) -> Result<PriceSeries, ProviderError> {
        let step = req.interval.step_seconds();
        let count = ((req.period.approx_trading_days() as i64 * 86_400 / step).max(1) as usize)
            .min(MAX_POINTS)
            + 1;

        let mut market = fastrand::Rng::with_seed(market_seed(req));
        let mut noise = fastrand::Rng::with_seed(symbol_seed(&req.symbol) ^ market_seed(req));
        let is_index = req.symbol.as_str().starts_with('^');
        let beta = if is_index {
            1.0
        } else {
            0.5 + (symbol_seed(&req.symbol) % 100) as f64 / 100.0
        };

        let mut price = 50.0 + (symbol_seed(&req.symbol) % 250) as f64;
        let mut points = Vec::with_capacity(count);
        for index in 0..count {
            let offset = step * (count - index - 1) as i64;
            let ts = UtcDateTime::from_unix_timestamp(ANCHOR_UNIX - offset)
                .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

            if index > 0 {
                let market_return = MARKET_DRIFT + MARKET_VOL * standard_normal(&mut market);
                let own_return = if is_index {
                    0.0
                } else {
                    IDIOSYNCRATIC_VOL * standard_normal(&mut noise)
                };
                price *= (1.0 + beta * market_return + own_return).max(0.01);
            }

            let jitter = symbol_seed(&req.symbol).wrapping_add(index as u64) % 500_000;
            let volume = 1_000_000 + jitter;
            let point = PricePoint::new(ts, price, Some(volume))
                .map_err(|e| ProviderError::invalid_response(e.to_string()))?;
            points.push(point);
        }

        PriceSeries::new(req.symbol.clone(), req.period, req.interval, points)
            .map_err(|e| ProviderError::invalid_response(e.to_string()))
    }
}

impl PriceProvider for SyntheticProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Synthetic
    }

    fn fetch_raw<'a>(
        &'a self,
        req: &'a PriceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = self.next_failure() {
                return Err(failure);
            }
            Self::generate(req)
        })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}

fn market_seed(req: &PriceRequest) -> u64 {
    format!("{}:{}", req.period, req.interval)
        .bytes()
        .fold(5381_u64, |acc, byte| acc.wrapping_mul(33) ^ byte as u64)
}

/// Irwin-Hall approximation: sum of twelve uniforms minus six.
fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    (0..12).map(|_| rng.f64()).sum::<f64>() - 6.0
}
