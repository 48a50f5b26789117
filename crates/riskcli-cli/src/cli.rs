//! CLI argument definitions for riskcli.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--period` | `1y` | Lookback window |
//! | `--interval` | `1d` | Bar granularity |
//! | `--benchmark` | `^GSPC` | Benchmark for beta/alpha/R² |
//! | `--rf` | `0.0` | Annual risk-free rate (`0.03`, `3%` or `3`) |
//! | `--export` | none | Write metrics to a `.json` or `.csv` file |
//! | `--compare` | `false` | Also compute `--compare-period` |
//! | `--mock` | `false` | Use deterministic synthetic prices |
//!
//! # Examples
//!
//! ```bash
//! riskcli AAPL
//! riskcli MSFT --period 2y --rf 4% --export msft.json
//! riskcli NVDA --compare --compare-period 5y
//! riskcli AAPL --mock --log-level debug
//! ```

use std::path::PathBuf;

use clap::Parser;

/// Risk and performance metrics for a ticker.
///
/// Fetches adjusted prices, computes annual return, volatility, Sharpe,
/// Sortino, drawdown, Calmar, beta/alpha/R² against a benchmark and
/// historical VaR/CVaR, and prints them as a table.
#[derive(Debug, Parser)]
#[command(name = "riskcli", author, version, about = "Risk metrics for a price series")]
pub struct Cli {
    /// Ticker symbol (e.g., AAPL, BRK-B, ^GSPC).
    pub ticker: String,

    /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
    #[arg(long, default_value = "1y")]
    pub period: String,

    /// Bar interval: 1m, 5m, 15m, 30m, 1h, 1d, 5d, 1wk, 1mo, 3mo.
    #[arg(long, default_value = "1d")]
    pub interval: String,

    /// Benchmark ticker used for beta, alpha and R².
    #[arg(long, default_value = "^GSPC")]
    pub benchmark: String,

    /// Skip the benchmark entirely.
    #[arg(long, default_value_t = false, conflicts_with = "benchmark")]
    pub no_benchmark: bool,

    /// Annual risk-free rate: 0.03, 3% and 3 all mean three percent.
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub rf: String,

    /// Export metrics to PATH; the extension picks the format (.json or .csv).
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Compute a second period and show both side by side.
    #[arg(long, default_value_t = false)]
    pub compare: bool,

    /// Period used by --compare.
    #[arg(long, default_value = "5y")]
    pub compare_period: String,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    pub mock: bool,

    /// Disable the in-process price cache.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Log level for stderr diagnostics; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["riskcli", "AAPL"]).expect("parse");

        assert_eq!(cli.ticker, "AAPL");
        assert_eq!(cli.period, "1y");
        assert_eq!(cli.interval, "1d");
        assert_eq!(cli.benchmark, "^GSPC");
        assert_eq!(cli.rf, "0.0");
        assert_eq!(cli.compare_period, "5y");
        assert!(!cli.compare && !cli.mock && !cli.no_cache && !cli.no_benchmark);
        assert!(cli.export.is_none());
    }

    #[test]
    fn negative_rate_is_not_mistaken_for_a_flag() {
        let cli = Cli::try_parse_from(["riskcli", "AAPL", "--rf", "-0.5%"]).expect("parse");
        assert_eq!(cli.rf, "-0.5%");
    }

    #[test]
    fn ticker_is_required() {
        assert!(Cli::try_parse_from(["riskcli"]).is_err());
    }
}
