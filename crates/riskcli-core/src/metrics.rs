//! Risk and performance metrics over a return series.
//!
//! Every field of [`MetricsResult`] is a [`MetricValue`]: either a finite
//! number or an explicit [`UndefinedReason`]. Nothing here produces `NaN`;
//! callers decide how to show an undefined value.
//!
//! Percent-class fields are stored as decimals (`0.12` is 12 %). Conversion
//! happens at the display boundary using [`MetricKind`].

use serde::{Serialize, Serializer};

use crate::{CoreError, PriceSeries, ReturnSeries, RiskFreeRate};

/// Sessions per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;
/// Smallest sample for which historical VaR/CVaR are reported.
pub const VAR_MIN_OBSERVATIONS: usize = 100;
/// Confidence level of the historical VaR.
pub const VAR_CONFIDENCE: f64 = 0.95;

const EPSILON: f64 = 1e-12;
// Variances are compared against the square of the dispersion threshold.
const VARIANCE_EPSILON: f64 = EPSILON * EPSILON;

/// Why a metric could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    InsufficientSample,
    ZeroVolatility,
    NoDownside,
    NoBenchmark,
    ZeroBenchmarkVariance,
    ZeroDrawdown,
    ZeroTail,
    NoVolume,
    NonFinite,
}

impl UndefinedReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientSample => "insufficient_sample",
            Self::ZeroVolatility => "zero_volatility",
            Self::NoDownside => "no_downside",
            Self::NoBenchmark => "no_benchmark",
            Self::ZeroBenchmarkVariance => "zero_benchmark_variance",
            Self::ZeroDrawdown => "zero_drawdown",
            Self::ZeroTail => "zero_tail",
            Self::NoVolume => "no_volume",
            Self::NonFinite => "non_finite",
        }
    }
}

impl std::fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed number or the reason there is none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    Undefined(UndefinedReason),
}

impl MetricValue {
    /// Wrap `value`, turning infinities and NaN into `Undefined(NonFinite)`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Undefined(UndefinedReason::NonFinite)
        }
    }

    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::Undefined(_) => None,
        }
    }

    pub const fn reason(self) -> Option<UndefinedReason> {
        match self {
            Self::Value(_) => None,
            Self::Undefined(reason) => Some(reason),
        }
    }

    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

/// Serialized as a JSON number, or `null` when undefined.
impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            Self::Undefined(_) => serializer.serialize_none(),
        }
    }
}

/// Display hint attached to every metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Decimal shown as a percentage.
    Percent,
    /// Plain decimal.
    Ratio,
    /// Currency amount.
    Amount,
}

/// One row of [`MetricsResult::fields`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: MetricKind,
    pub value: MetricValue,
}

/// Full metric set for one asset over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsResult {
    pub annual_return: MetricValue,
    pub annual_volatility: MetricValue,
    pub sharpe: MetricValue,
    pub sortino: MetricValue,
    pub max_drawdown: MetricValue,
    pub calmar: MetricValue,
    pub beta: MetricValue,
    pub alpha: MetricValue,
    pub r_squared: MetricValue,
    pub var_95: MetricValue,
    pub cvar_95: MetricValue,
    pub tail_ratio: MetricValue,
    pub skew: MetricValue,
    pub excess_kurtosis: MetricValue,
    pub avg_daily_dollar_volume: MetricValue,
    /// Number of returns the metrics were computed from.
    pub observations: usize,
    pub risk_free_rate: RiskFreeRate,
}

impl MetricsResult {
    /// All metrics in report order.
    pub fn fields(&self) -> Vec<MetricField> {
        use MetricKind::{Amount, Percent, Ratio};

        let field = |key, label, kind, value| MetricField {
            key,
            label,
            kind,
            value,
        };

        vec![
            field("annual_return", "Annual Return", Percent, self.annual_return),
            field("annual_volatility", "Annual Volatility", Percent, self.annual_volatility),
            field("sharpe", "Sharpe", Ratio, self.sharpe),
            field("sortino", "Sortino", Ratio, self.sortino),
            field("max_drawdown", "Max Drawdown", Percent, self.max_drawdown),
            field("calmar", "Calmar", Ratio, self.calmar),
            field("beta", "Beta", Ratio, self.beta),
            field("alpha", "Alpha", Percent, self.alpha),
            field("r_squared", "R²", Percent, self.r_squared),
            field("var_95", "VaR 95% (1d)", Percent, self.var_95),
            field("cvar_95", "CVaR 95% (1d)", Percent, self.cvar_95),
            field("tail_ratio", "Tail Ratio", Ratio, self.tail_ratio),
            field("skew", "Skew", Ratio, self.skew),
            field("excess_kurtosis", "Excess Kurtosis", Ratio, self.excess_kurtosis),
            field(
                "avg_daily_dollar_volume",
                "Avg Daily $ Volume",
                Amount,
                self.avg_daily_dollar_volume,
            ),
        ]
    }

    /// Look a metric up by its export key.
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.fields()
            .into_iter()
            .find(|field| field.key == key)
            .map(|field| field.value)
    }
}

/// Stateless metric calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEngine;

impl MetricsEngine {
    /// Compute every metric from an asset return series and an optional
    /// benchmark. The benchmark is aligned to the asset by timestamp first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientData`] when the asset has fewer than
    /// two returns. Shorter-than-needed samples for individual metrics only
    /// mark those metrics undefined.
    pub fn compute(
        asset: &ReturnSeries,
        benchmark: Option<&ReturnSeries>,
        rf: RiskFreeRate,
    ) -> Result<MetricsResult, CoreError> {
        let r = asset.values();
        if r.len() < 2 {
            return Err(CoreError::InsufficientData {
                required: 2,
                actual: r.len(),
            });
        }

        let rf_daily = rf.daily(TRADING_DAYS);
        let mean = mean(r);
        let stdev = sample_variance(r, mean).sqrt();

        let annual_return = MetricValue::from_f64(annualize_return(mean));
        let annual_volatility = MetricValue::from_f64(stdev * TRADING_DAYS.sqrt());
        let sharpe = if stdev <= EPSILON {
            MetricValue::Undefined(UndefinedReason::ZeroVolatility)
        } else {
            MetricValue::from_f64((mean - rf_daily) / stdev * TRADING_DAYS.sqrt())
        };

        let max_drawdown = MetricValue::from_f64(max_drawdown(r));
        let calmar = match (annual_return, max_drawdown) {
            (_, MetricValue::Value(mdd)) if mdd.abs() <= EPSILON => {
                MetricValue::Undefined(UndefinedReason::ZeroDrawdown)
            }
            (MetricValue::Value(ret), MetricValue::Value(mdd)) => {
                MetricValue::from_f64(ret / mdd.abs())
            }
            (MetricValue::Undefined(reason), _) | (_, MetricValue::Undefined(reason)) => {
                MetricValue::Undefined(reason)
            }
        };

        let (beta, alpha, r_squared) = match benchmark {
            Some(benchmark) => regression(asset, benchmark),
            None => {
                let missing = MetricValue::Undefined(UndefinedReason::NoBenchmark);
                (missing, missing, missing)
            }
        };

        let (var_95, cvar_95) = historical_var(r);

        Ok(MetricsResult {
            annual_return,
            annual_volatility,
            sharpe,
            sortino: sortino(r, mean, rf_daily),
            max_drawdown,
            calmar,
            beta,
            alpha,
            r_squared,
            var_95,
            cvar_95,
            tail_ratio: tail_ratio(r),
            skew: skew(r, mean),
            excess_kurtosis: excess_kurtosis(r, mean),
            avg_daily_dollar_volume: MetricValue::Undefined(UndefinedReason::NoVolume),
            observations: r.len(),
            risk_free_rate: rf,
        })
    }

    /// Derive returns from prices, compute, and add dollar volume.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientData`] when the asset has fewer than
    /// three price points. A benchmark too short to produce returns is treated
    /// as absent.
    pub fn compute_prices(
        asset: &PriceSeries,
        benchmark: Option<&PriceSeries>,
        rf: RiskFreeRate,
    ) -> Result<MetricsResult, CoreError> {
        let asset_returns = asset.returns()?;
        let benchmark_returns = benchmark.and_then(|series| series.returns().ok());

        let mut result = Self::compute(&asset_returns, benchmark_returns.as_ref(), rf)?;
        result.avg_daily_dollar_volume = dollar_volume(asset);
        Ok(result)
    }
}

/// `(1 + mean)^252 - 1`.
pub fn annualize_return(mean_daily: f64) -> f64 {
    (1.0 + mean_daily).powf(TRADING_DAYS) - 1.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

fn sample_covariance(a: &[f64], a_mean: f64, b: &[f64], b_mean: f64) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - a_mean) * (y - b_mean))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Linear-interpolated percentile of an ascending slice at rank `p * (n - 1)`.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

// Downside threshold is zero, not the risk-free rate.
fn sortino(r: &[f64], mean: f64, rf_daily: f64) -> MetricValue {
    let downside: Vec<f64> = r.iter().copied().filter(|v| *v < 0.0).collect();
    match downside.len() {
        0 => MetricValue::Undefined(UndefinedReason::NoDownside),
        1 => MetricValue::Undefined(UndefinedReason::InsufficientSample),
        _ => {
            let deviation = sample_variance(&downside, self::mean(&downside)).sqrt();
            if deviation <= EPSILON {
                MetricValue::Undefined(UndefinedReason::ZeroVolatility)
            } else {
                MetricValue::from_f64((mean - rf_daily) / deviation * TRADING_DAYS.sqrt())
            }
        }
    }
}

fn max_drawdown(r: &[f64]) -> f64 {
    let mut wealth = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for value in r {
        wealth *= 1.0 + value;
        peak = peak.max(wealth);
        worst = worst.min((wealth - peak) / peak);
    }
    worst
}

fn regression(
    asset: &ReturnSeries,
    benchmark: &ReturnSeries,
) -> (MetricValue, MetricValue, MetricValue) {
    let (a, b) = asset.align(benchmark);
    if a.len() < 2 {
        let short = MetricValue::Undefined(UndefinedReason::InsufficientSample);
        return (short, short, short);
    }

    let (a, b) = (a.values(), b.values());
    let a_mean = mean(a);
    let b_mean = mean(b);
    let a_var = sample_variance(a, a_mean);
    let b_var = sample_variance(b, b_mean);
    if b_var <= VARIANCE_EPSILON {
        let flat = MetricValue::Undefined(UndefinedReason::ZeroBenchmarkVariance);
        return (flat, flat, flat);
    }

    let cov = sample_covariance(a, a_mean, b, b_mean);
    let beta = cov / b_var;
    let alpha = annualize_return(a_mean) - beta * annualize_return(b_mean);
    let r_squared = if a_var <= VARIANCE_EPSILON {
        MetricValue::Undefined(UndefinedReason::ZeroVolatility)
    } else {
        MetricValue::from_f64(cov * cov / (a_var * b_var))
    };

    (MetricValue::from_f64(beta), MetricValue::from_f64(alpha), r_squared)
}

fn historical_var(r: &[f64]) -> (MetricValue, MetricValue) {
    if r.len() < VAR_MIN_OBSERVATIONS {
        let short = MetricValue::Undefined(UndefinedReason::InsufficientSample);
        return (short, short);
    }

    let sorted = sorted(r);
    let var = percentile(&sorted, 1.0 - VAR_CONFIDENCE);
    let tail: Vec<f64> = sorted.iter().copied().take_while(|v| *v <= var).collect();
    let cvar = if tail.is_empty() { var } else { mean(&tail) };

    (MetricValue::from_f64(var), MetricValue::from_f64(cvar))
}

fn tail_ratio(r: &[f64]) -> MetricValue {
    let sorted = sorted(r);
    let high = percentile(&sorted, 0.95).abs();
    let low = percentile(&sorted, 0.05).abs();
    if low <= EPSILON {
        return MetricValue::Undefined(UndefinedReason::ZeroTail);
    }
    MetricValue::from_f64(high / low)
}

/// Adjusted Fisher-Pearson skewness.
fn skew(r: &[f64], mean: f64) -> MetricValue {
    let n = r.len() as f64;
    if r.len() < 3 {
        return MetricValue::Undefined(UndefinedReason::InsufficientSample);
    }
    let m2 = r.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = r.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 <= VARIANCE_EPSILON {
        return MetricValue::Undefined(UndefinedReason::ZeroVolatility);
    }
    let g1 = m3 / m2.powf(1.5);
    MetricValue::from_f64((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// Unbiased sample excess kurtosis.
fn excess_kurtosis(r: &[f64], mean: f64) -> MetricValue {
    let n = r.len() as f64;
    if r.len() < 4 {
        return MetricValue::Undefined(UndefinedReason::InsufficientSample);
    }
    let m2 = r.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m4 = r.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
    if m2 <= VARIANCE_EPSILON {
        return MetricValue::Undefined(UndefinedReason::ZeroVolatility);
    }
    let g2 = m4 / (m2 * m2) - 3.0;
    MetricValue::from_f64((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0))
}

fn dollar_volume(series: &PriceSeries) -> MetricValue {
    let traded: Vec<f64> = series
        .points()
        .iter()
        .filter_map(|point| point.volume.map(|volume| point.price * volume as f64))
        .collect();
    if traded.is_empty() {
        return MetricValue::Undefined(UndefinedReason::NoVolume);
    }
    MetricValue::from_f64(mean(&traded))
}
