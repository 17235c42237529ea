use analysis_core::{AnalysisError, Series, SeriesProvider};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::transport_error;

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily closing prices from the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; finquery/0.1)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded as a
    /// single path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, AnalysisError> {
        if symbol.is_empty() || symbol == "." || symbol == ".." {
            return Err(AnalysisError::Fetch(format!("Invalid ticker symbol {:?}", symbol)));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AnalysisError::Fetch(format!("Invalid Yahoo Finance base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AnalysisError::Fetch(format!("Yahoo Finance base URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart"])
            .push(symbol);
        Ok(url)
    }

    /// Get daily closes for a symbol. `end` is inclusive.
    pub async fn get_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, AnalysisError> {
        let url = self.chart_url(symbol)?;
        let period1 = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        let period2 = (end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc().timestamp())
            .unwrap_or(period1);

        tracing::debug!("Yahoo chart request for {} ({} to {})", symbol, start, end);

        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("Yahoo Finance", e))?;

        let status = response.status();
        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Fetch(format!("Yahoo Finance HTTP {}: {}", status, e)))?;

        parse_chart(symbol, body)
    }
}

#[async_trait]
impl SeriesProvider for YahooClient {
    async fn fetch_series(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, AnalysisError> {
        self.get_daily_closes(identifier, start, end).await
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

fn parse_chart(symbol: &str, body: ChartResponse) -> Result<Series, AnalysisError> {
    if let Some(error) = body.chart.error {
        return Err(AnalysisError::Fetch(format!(
            "Yahoo Finance error for {}: {} - {}",
            symbol, error.code, error.description
        )));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AnalysisError::Fetch(format!("No data found for {}", symbol)))?;

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let points: Vec<(NaiveDate, f64)> = result
        .timestamp
        .unwrap_or_default()
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some((date, close?))
        })
        .collect();

    if points.is_empty() {
        return Err(AnalysisError::Fetch(format!("No data found for {}", symbol)));
    }

    Ok(Series::from_points(symbol, points))
}

// Yahoo chart API types
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
