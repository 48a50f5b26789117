use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{PriceProvider, PriceRequest, ProviderError, ProviderId};
use crate::{PricePoint, PriceSeries, UtcDateTime};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart adapter (`/v8/finance/chart/{symbol}`).
///
/// One call is one upstream attempt; the fetcher owns retries.
#[derive(Clone)]
pub struct YahooChartProvider {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for YahooChartProvider {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooChartProvider {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(CHART_ENDPOINT),
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, req: &PriceRequest) -> String {
        format!(
            "{}/{}?range={}&interval={}&events=div%2Csplits&includeAdjustedClose=true",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(req.symbol.as_str()),
            req.period.as_str(),
            req.interval.as_str(),
        )
    }

    async fn fetch_chart(&self, req: &PriceRequest) -> Result<PriceSeries, ProviderError> {
        let request = HttpRequest::get(self.endpoint(req))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.retryable() {
                ProviderError::unavailable(format!("yahoo transport error: {}", error.message()))
            } else {
                ProviderError::invalid_request(format!(
                    "yahoo transport error: {}",
                    error.message()
                ))
            }
        })?;

        if !response.is_success() {
            return Err(classify_status(response.status, &response.body));
        }

        parse_chart(req, &response.body)
    }
}

impl PriceProvider for YahooChartProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch_raw<'a>(
        &'a self,
        req: &'a PriceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(self.fetch_chart(req))
    }
}

/// Map a non-2xx status to an error class.
fn classify_status(status: u16, body: &str) -> ProviderError {
    let detail = chart_error_description(body)
        .unwrap_or_else(|| format!("yahoo returned status {status}"));

    match status {
        429 => ProviderError::rate_limited(detail),
        404 => ProviderError::not_found(detail),
        408 | 500..=599 => ProviderError::unavailable(detail),
        _ => ProviderError::invalid_request(detail),
    }
}

fn chart_error_description(body: &str) -> Option<String> {
    let parsed: YahooChartResponse = serde_json::from_str(body).ok()?;
    parsed.chart.error.map(|error| error.describe())
}

fn parse_chart(req: &PriceRequest, body: &str) -> Result<PriceSeries, ProviderError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart_response.chart.error {
        let description = error.describe();
        return Err(if error.code.eq_ignore_ascii_case("not found") {
            ProviderError::not_found(description)
        } else {
            ProviderError::invalid_response(format!("yahoo chart API error: {description}"))
        });
    }

    let result = chart_response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::not_found(format!("no chart data for {}", req.symbol)))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    // One price column per series; adjusted and raw closes are never mixed.
    let adjclose = result.indicators.adjclose.into_iter().next();
    let closes: &[Option<f64>] = match &adjclose {
        Some(block) => &block.adjclose,
        None => &quote.close,
    };

    let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
    for (i, &ts_value) in timestamps.iter().enumerate() {
        let price = closes.get(i).copied().flatten();
        let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0) else {
            continue;
        };

        let ts = UtcDateTime::from_unix_timestamp(ts_value)
            .map_err(|e| ProviderError::invalid_response(format!("invalid timestamp: {e}")))?;
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .and_then(|v| u64::try_from(v).ok());
        let point = PricePoint::new(ts, price, volume)
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;

        // Yahoo occasionally repeats the live bar; the later row wins.
        match points.last_mut() {
            Some(last) if last.ts == point.ts => *last = point,
            Some(last) if last.ts > point.ts => continue,
            _ => points.push(point),
        }
    }

    if points.is_empty() {
        return Err(ProviderError::not_found(format!(
            "no price data for '{}' with period='{}', interval='{}'",
            req.symbol, req.period, req.interval
        )));
    }

    PriceSeries::new(req.symbol.clone(), req.period, req.interval, points)
        .map_err(|e| ProviderError::invalid_response(e.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn describe(&self) -> String {
        match &self.description {
            Some(description) if !description.is_empty() => {
                format!("{}: {}", self.code, description)
            }
            _ => self.code.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
