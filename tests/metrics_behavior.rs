//! Behavior-driven tests for the metrics engine
//!
//! These tests verify WHAT the engine reports for characteristic return
//! series: sample-size gates, degenerate inputs and benchmark handling.

use riskcli_core::{
    normalize_rate, Interval, MetricValue, MetricsEngine, Period, PricePoint, PriceSeries,
    ReturnSeries, RiskFreeRate, Symbol, SyntheticProvider, UndefinedReason, UtcDateTime,
};
use riskcli_core::provider::PriceRequest;

fn returns(values: Vec<f64>) -> ReturnSeries {
    ReturnSeries::from_values(values).expect("finite returns")
}

/// Alternating `mean ± spread` series; even lengths have exactly `mean`.
fn alternating(n: usize, mean: f64, spread: f64) -> Vec<f64> {
    (0..n)
        .map(|i| if i % 2 == 0 { mean + spread } else { mean - spread })
        .collect()
}

fn noisy(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n).map(|_| (rng.f64() - 0.5) * 0.04).collect()
}

// =============================================================================
// Metrics: Annualization
// =============================================================================

#[test]
fn when_a_year_of_returns_has_known_moments_system_annualizes_them() {
    // Given: 252 returns with mean 0.0004 and sample stdev exactly 0.01
    let spread = 0.01 * (251.0_f64 / 252.0).sqrt();
    let series = returns(alternating(252, 0.0004, spread));

    // When: The metrics are computed
    let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    // Then: Annual return follows (1 + mean)^252 - 1 and volatility stdev * sqrt(252)
    let annual_return = result.annual_return.value().expect("defined");
    let annual_volatility = result.annual_volatility.value().expect("defined");
    assert!((annual_return - 0.1060).abs() < 5e-4, "annual return {annual_return}");
    assert!((annual_volatility - 0.1587).abs() < 5e-4, "annual vol {annual_volatility}");
    assert_eq!(result.observations, 252);
}

#[test]
fn when_the_same_series_is_computed_twice_system_returns_identical_results() {
    let series = returns(noisy(300, 11));

    let first = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");
    let second = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    assert_eq!(first, second);
}

#[test]
fn when_risk_free_rate_rises_system_lowers_sharpe() {
    let series = returns(noisy(252, 3));

    let free = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");
    let costly = MetricsEngine::compute(&series, None, normalize_rate("5%").expect("rate"))
        .expect("metrics");

    assert!(costly.sharpe.value() < free.sharpe.value());
    assert_eq!(costly.annual_return, free.annual_return);
}

// =============================================================================
// Metrics: Sample-size Gates
// =============================================================================

#[test]
fn when_fewer_than_100_observations_system_leaves_var_undefined() {
    // Given: 99 returns
    let series = returns(noisy(99, 5));

    // When: The metrics are computed
    let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    // Then: VaR and CVaR carry the insufficient-sample marker
    let short = MetricValue::Undefined(UndefinedReason::InsufficientSample);
    assert_eq!(result.var_95, short);
    assert_eq!(result.cvar_95, short);
    assert!(result.sharpe.is_defined(), "other metrics are unaffected");
}

#[test]
fn when_exactly_100_observations_system_computes_var_and_cvar() {
    // Given: 100 returns
    let series = returns(noisy(100, 5));

    // When: The metrics are computed
    let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    // Then: VaR is a loss and CVaR is at least as bad
    let var = result.var_95.value().expect("defined");
    let cvar = result.cvar_95.value().expect("defined");
    assert!(var < 0.0);
    assert!(cvar <= var);
}

#[test]
fn when_only_one_return_exists_system_reports_insufficient_data() {
    let error = MetricsEngine::compute(&returns(vec![0.01]), None, RiskFreeRate::ZERO)
        .expect_err("single return must fail");

    assert_eq!(error.code(), "core.insufficient_data");
}

// =============================================================================
// Metrics: Degenerate Series
// =============================================================================

#[test]
fn when_returns_are_constant_system_leaves_sharpe_and_sortino_undefined() {
    for constant in [0.001, 0.0, -0.001] {
        // Given: A constant return series
        let series = returns(vec![constant; 120]);

        // When: The metrics are computed
        let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

        // Then: Ratios with a dispersion denominator are undefined, never zero or NaN
        assert!(!result.sharpe.is_defined(), "sharpe for {constant}");
        assert!(!result.sortino.is_defined(), "sortino for {constant}");
        assert_eq!(result.annual_volatility.value().map(|v| v.abs() < 1e-9), Some(true));
    }
}

#[test]
fn when_no_return_is_negative_system_marks_sortino_as_no_downside() {
    let series = returns(vec![0.01, 0.02, 0.0, 0.005]);

    let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    assert_eq!(result.sortino, MetricValue::Undefined(UndefinedReason::NoDownside));
}

// =============================================================================
// Metrics: Drawdown
// =============================================================================

#[test]
fn when_returns_are_random_system_reports_non_positive_drawdown() {
    for seed in 0..20 {
        let result = MetricsEngine::compute(&returns(noisy(200, seed)), None, RiskFreeRate::ZERO)
            .expect("metrics");

        let mdd = result.max_drawdown.value().expect("defined");
        assert!(mdd <= 0.0, "seed {seed}: {mdd}");
        assert!(mdd > -1.0, "seed {seed}: {mdd}");
    }
}

#[test]
fn when_wealth_never_declines_system_reports_zero_drawdown() {
    let series = returns(vec![0.01, 0.0, 0.02, 0.003, 0.0]);

    let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    assert_eq!(result.max_drawdown.value(), Some(0.0));
    assert_eq!(result.calmar, MetricValue::Undefined(UndefinedReason::ZeroDrawdown));
}

#[test]
fn when_first_return_is_a_loss_system_counts_it_against_initial_wealth() {
    let series = returns(vec![-0.2, 0.1, 0.1]);

    let result = MetricsEngine::compute(&series, None, RiskFreeRate::ZERO).expect("metrics");

    let mdd = result.max_drawdown.value().expect("defined");
    assert!((mdd + 0.2).abs() < 1e-12);
}

// =============================================================================
// Metrics: Benchmark
// =============================================================================

#[test]
fn when_no_benchmark_is_given_system_leaves_regression_fields_undefined() {
    let result = MetricsEngine::compute(&returns(noisy(150, 1)), None, RiskFreeRate::ZERO)
        .expect("metrics");

    let missing = MetricValue::Undefined(UndefinedReason::NoBenchmark);
    assert_eq!(result.beta, missing);
    assert_eq!(result.alpha, missing);
    assert_eq!(result.r_squared, missing);
}

#[test]
fn when_benchmark_varies_system_computes_beta_alpha_and_r_squared() {
    // Given: An asset that is 1.5x a varying benchmark plus noise
    let bench = noisy(150, 2);
    let noise = noisy(150, 9);
    let asset: Vec<f64> = bench
        .iter()
        .zip(&noise)
        .map(|(b, n)| 1.5 * b + 0.1 * n)
        .collect();

    // When: The metrics are computed against the benchmark
    let result = MetricsEngine::compute(&returns(asset), Some(&returns(bench)), RiskFreeRate::ZERO)
        .expect("metrics");

    // Then: Beta is close to the loading and R² is a valid fraction
    let beta = result.beta.value().expect("defined");
    let r_squared = result.r_squared.value().expect("defined");
    assert!((beta - 1.5).abs() < 0.1, "beta {beta}");
    assert!(r_squared > 0.9 && r_squared <= 1.0, "r2 {r_squared}");
    assert!(result.alpha.is_defined());
}

#[test]
fn when_benchmark_calendar_is_shorter_system_uses_only_shared_dates() {
    // Given: Price series where the benchmark misses the asset's first bars
    let symbol = Symbol::parse("AAPL").expect("valid");
    let asset = SyntheticProvider::generate(&PriceRequest::new(
        symbol,
        Period::SixMonths,
        Interval::OneDay,
    ))
    .expect("series");
    let bench_points: Vec<PricePoint> = asset.points()[10..]
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let ts = UtcDateTime::from_unix_timestamp(p.ts.unix_timestamp() + 3_600).expect("ts");
            PricePoint::new(ts, 100.0 + (i % 7) as f64, None).expect("point")
        })
        .collect();
    let bench = PriceSeries::new(
        Symbol::parse("^GSPC").expect("valid"),
        Period::SixMonths,
        Interval::OneDay,
        bench_points,
    )
    .expect("series");

    // When: Metrics are computed from prices
    let result = MetricsEngine::compute_prices(&asset, Some(&bench), RiskFreeRate::ZERO)
        .expect("metrics");

    // Then: Regression fields are defined and the asset keeps its full sample
    assert!(result.beta.is_defined());
    assert_eq!(result.observations, asset.len() - 1);
    assert!(result.avg_daily_dollar_volume.is_defined());
}

// =============================================================================
// Rate Normalizer
// =============================================================================

#[test]
fn when_rate_is_written_three_ways_system_normalizes_to_the_same_decimal() {
    for raw in ["0.02", "2%", "2"] {
        let rate = normalize_rate(raw).expect("valid rate");
        assert!((rate.annual() - 0.02).abs() < 1e-12, "{raw}");
    }
}

#[test]
fn when_rate_is_not_a_number_system_rejects_it() {
    assert!(normalize_rate("two percent").is_err());
    assert!(normalize_rate("NaN").is_err());
}
