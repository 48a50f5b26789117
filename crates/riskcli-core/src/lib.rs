//! # riskcli Core
//!
//! Risk/performance metrics for a price series, and the resilient fetch layer
//! that feeds them.
//!
//! ## Overview
//!
//! - **Domain models** for symbols, periods, intervals and price/return series
//! - **Rate normalizer** turning `"3%"`, `"3"` or `"0.03"` into one decimal
//! - **Fetch resilience**: read-through TTL cache plus jittered retry/backoff
//! - **Provider adapters**: Yahoo chart API and a deterministic synthetic source
//! - **Metrics engine** with explicit undefined markers instead of `NaN`
//! - **Analyzer** running the pipeline for one period or two side by side
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo chart, synthetic) |
//! | [`analysis`] | Single-period analysis and two-period compare |
//! | [`cache`] | TTL cache of price series with injectable clock |
//! | [`config`] | Runtime knobs and `RISKCLI_*` environment overrides |
//! | [`domain`] | Domain models (Symbol, Period, Interval, PriceSeries) |
//! | [`error`] | Core error types |
//! | [`fetch`] | Cache-first retrying fetcher |
//! | [`http_client`] | HTTP client abstraction |
//! | [`metrics`] | Metrics engine and result types |
//! | [`provider`] | Provider trait and classified provider errors |
//! | [`rate`] | Risk-free rate normalization |
//! | [`retry`] | Backoff policy |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use riskcli_core::{
//!     AnalysisRequest, Analyzer, Interval, Period, PriceFetcher, Symbol, YahooChartProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = PriceFetcher::new(Arc::new(YahooChartProvider::default()));
//!     let analyzer = Analyzer::new(Arc::new(fetcher));
//!
//!     let request = AnalysisRequest::new(Symbol::parse("AAPL")?, Period::OneYear, Interval::OneDay)
//!         .with_benchmark(Symbol::parse("^GSPC")?)
//!         .with_risk_free_rate("4%".parse()?);
//!     let report = analyzer.analyze(&request).await?;
//!
//!     println!("sharpe: {:?}", report.metrics.sharpe.value());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │    Analyzer     │────▶│  Metrics Engine  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  PriceFetcher   │────▶│ CacheStore       │
//! │  (retry/backoff)│     │ (TTL 300 s)      │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ PriceProvider   │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use riskcli_core::{CoreError, ProviderErrorKind};
//!
//! fn describe(error: &CoreError) -> &'static str {
//!     match error {
//!         CoreError::Validation(_) => "fix the input",
//!         CoreError::InsufficientData { .. } => "pick a longer period",
//!         CoreError::DataUnavailable { source, .. } => match source.kind() {
//!             ProviderErrorKind::NotFound => "unknown ticker",
//!             _ => "provider failed",
//!         },
//!         CoreError::Serialization(_) => "internal error",
//!     }
//! }
//! ```

pub mod adapters;
pub mod analysis;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod metrics;
pub mod provider;
pub mod rate;
pub mod retry;

// Adapter implementations
pub use adapters::{SyntheticProvider, YahooChartProvider};

// Analysis pipeline
pub use analysis::{AnalysisRequest, Analyzer, CompareRequest, CompareResult, PeriodReport};

// Caching
pub use cache::{CacheKey, CacheStore, Clock, ManualClock, SystemClock};

// Configuration
pub use config::RiskConfig;

// Domain models
pub use domain::{
    Interval, Period, PricePoint, PriceSeries, ReturnSeries, SeriesSummary, Symbol, UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// Fetching
pub use fetch::PriceFetcher;

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Metrics
pub use metrics::{
    MetricField, MetricKind, MetricValue, MetricsEngine, MetricsResult, UndefinedReason,
    TRADING_DAYS,
};

// Providers
pub use provider::{PriceProvider, PriceRequest, ProviderError, ProviderErrorKind, ProviderId};

// Rates
pub use rate::{normalize_rate, RiskFreeRate};

// Retry logic
pub use retry::{Backoff, DelayWindow, RetryConfig};
