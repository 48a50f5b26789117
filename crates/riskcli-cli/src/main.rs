mod cli;
mod error;
mod export;
mod logging;
mod metadata;
mod report;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use riskcli_core::{
    normalize_rate, AnalysisRequest, Analyzer, CompareRequest, Interval, Period, PriceFetcher,
    PriceProvider, RiskConfig, Symbol, SyntheticProvider, YahooChartProvider,
};
use tracing::debug;

use crate::cli::Cli;
use crate::error::CliError;
use crate::export::{ExportFormat, ExportPayload};
use crate::metadata::RunMetadata;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let outcome = tokio::select! {
        result = run(&cli) => result,
        _ = tokio::signal::ctrl_c() => Err(CliError::Interrupted),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    // Validate every input before the first network call.
    let symbol = Symbol::parse(&cli.ticker)?;
    let period: Period = cli.period.parse()?;
    let interval: Interval = cli.interval.parse()?;
    let compare_period: Period = cli.compare_period.parse()?;
    let rf = normalize_rate(&cli.rf)?;
    let benchmark = if cli.no_benchmark {
        None
    } else {
        Some(Symbol::parse(&cli.benchmark)?)
    };
    if let Some(path) = &cli.export {
        ExportFormat::from_path(path)?;
    }

    let mut config = RiskConfig::from_env()?;
    if cli.no_cache {
        config = config.without_cache();
    }
    debug!(?config, mock = cli.mock, "starting run");

    let provider: Arc<dyn PriceProvider> = if cli.mock {
        Arc::new(SyntheticProvider::new())
    } else {
        Arc::new(YahooChartProvider::default().with_timeout_ms(config.http_timeout_ms))
    };
    let fetcher = PriceFetcher::new(provider)
        .with_cache(config.cache_store())
        .with_retry(config.retry.clone());
    let analyzer = Analyzer::new(Arc::new(fetcher));

    let mut request = AnalysisRequest::new(symbol, period, interval).with_risk_free_rate(rf);
    if let Some(benchmark) = benchmark {
        request = request.with_benchmark(benchmark);
    }

    let meta = RunMetadata::new();
    if cli.compare {
        let result = analyzer
            .compare(&CompareRequest::new(request, compare_period))
            .await?;
        print_warnings(&result.primary.warnings);
        print_warnings(&result.comparison.warnings);
        println!("{}", report::render_compare(&result));
        if let Some(path) = &cli.export {
            export::write(path, ExportPayload::Compare(&result), &meta)?;
        }
    } else {
        let period_report = analyzer.analyze(&request).await?;
        print_warnings(&period_report.warnings);
        println!("{}", report::render_period(&period_report));
        if let Some(path) = &cli.export {
            export::write(path, ExportPayload::Single(&period_report), &meta)?;
        }
    }

    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}
