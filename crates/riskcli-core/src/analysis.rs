//! Single-period analysis and two-period comparison.
//!
//! [`Analyzer::analyze`] is the whole pipeline for one window: fetch the
//! asset, fetch the benchmark, compute. [`Analyzer::compare`] runs it once
//! per period; the two results are never mixed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::fetch::PriceFetcher;
use crate::metrics::{MetricsEngine, MetricsResult};
use crate::{CoreError, Interval, Period, RiskFreeRate, SeriesSummary, Symbol};

/// Trailing prices kept on a report for the header sparkline.
pub const RECENT_PRICES: usize = 32;

/// Inputs for one analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub symbol: Symbol,
    pub period: Period,
    pub interval: Interval,
    pub benchmark: Option<Symbol>,
    pub risk_free_rate: RiskFreeRate,
}

impl AnalysisRequest {
    pub fn new(symbol: Symbol, period: Period, interval: Interval) -> Self {
        Self {
            symbol,
            period,
            interval,
            benchmark: None,
            risk_free_rate: RiskFreeRate::ZERO,
        }
    }

    pub fn with_benchmark(mut self, benchmark: Symbol) -> Self {
        self.benchmark = Some(benchmark);
        self
    }

    pub fn with_risk_free_rate(mut self, rate: RiskFreeRate) -> Self {
        self.risk_free_rate = rate;
        self
    }

    fn for_period(&self, period: Period) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

/// Inputs for a primary/comparison run sharing everything but the period.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRequest {
    pub base: AnalysisRequest,
    pub comparison_period: Period,
}

impl CompareRequest {
    pub fn new(base: AnalysisRequest, comparison_period: Period) -> Self {
        Self {
            base,
            comparison_period,
        }
    }
}

/// Metrics for one window plus what the report header needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodReport {
    pub period: Period,
    pub summary: SeriesSummary,
    /// Up to [`RECENT_PRICES`] trailing adjusted closes, oldest first.
    pub recent_prices: Vec<f64>,
    pub benchmark: Option<Symbol>,
    pub metrics: MetricsResult,
    /// Non-fatal problems, e.g. a benchmark that could not be fetched.
    pub warnings: Vec<String>,
}

/// Two independently computed windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareResult {
    pub primary_period: Period,
    pub comparison_period: Period,
    pub primary: PeriodReport,
    pub comparison: PeriodReport,
}

/// Runs the fetch + compute pipeline.
#[derive(Debug, Clone)]
pub struct Analyzer {
    fetcher: Arc<PriceFetcher>,
}

impl Analyzer {
    pub fn new(fetcher: Arc<PriceFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &PriceFetcher {
        &self.fetcher
    }

    /// Fetch and compute one window.
    ///
    /// A failed asset fetch is an error. A failed benchmark fetch is
    /// downgraded to a warning and the benchmark metrics become undefined.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<PeriodReport, CoreError> {
        let asset = self
            .fetcher
            .fetch(&request.symbol, request.period, request.interval)
            .await?;

        let mut warnings = Vec::new();
        let benchmark = match &request.benchmark {
            Some(symbol) => match self
                .fetcher
                .fetch(symbol, request.period, request.interval)
                .await
            {
                Ok(series) => Some(series),
                Err(error) => {
                    warn!(benchmark = %symbol, "benchmark unavailable: {error}");
                    warnings.push(format!(
                        "benchmark {symbol} unavailable, beta/alpha/R² omitted: {error}"
                    ));
                    None
                }
            },
            None => None,
        };

        let metrics =
            MetricsEngine::compute_prices(&asset, benchmark.as_ref(), request.risk_free_rate)?;
        info!(
            symbol = %request.symbol,
            period = %request.period,
            observations = metrics.observations,
            "computed metrics"
        );

        let recent_prices = asset
            .points()
            .iter()
            .skip(asset.len().saturating_sub(RECENT_PRICES))
            .map(|point| point.price)
            .collect();

        Ok(PeriodReport {
            period: request.period,
            summary: asset.summary(),
            recent_prices,
            benchmark: benchmark.map(|series| series.symbol),
            metrics,
            warnings,
        })
    }

    /// Analyze the base period, then the comparison period.
    pub async fn compare(&self, request: &CompareRequest) -> Result<CompareResult, CoreError> {
        let primary = self.analyze(&request.base).await?;
        let comparison = self
            .analyze(&request.base.for_period(request.comparison_period))
            .await?;

        Ok(CompareResult {
            primary_period: request.base.period,
            comparison_period: request.comparison_period,
            primary,
            comparison,
        })
    }
}
