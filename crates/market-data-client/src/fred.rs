use analysis_core::{AnalysisError, Series, SeriesProvider};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::transport_error;

const BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// Observations for a FRED economic data series.
#[derive(Clone)]
pub struct FredClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl FredClient {
    pub fn new(api_key: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("FRED API key is empty; macro series requests will fail");
        }

        Self {
            api_key,
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get observations for a series between `start` and `end`, inclusive.
    pub async fn get_observations(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, AnalysisError> {
        let url = format!("{}/series/observations", self.base_url);

        tracing::debug!("FRED observations request for {} ({} to {})", series_id, start, end);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id.to_string()),
                ("api_key", self.api_key.trim().to_string()),
                ("file_type", "json".to_string()),
                ("observation_start", start.format("%Y-%m-%d").to_string()),
                ("observation_end", end.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("FRED", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<FredErrorResponse>(&text)
                .map(|e| e.error_message)
                .unwrap_or(text);
            return Err(AnalysisError::Fetch(format!("FRED HTTP {}: {}", status, message)));
        }

        let body: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?;

        parse_observations(series_id, body)
    }
}

#[async_trait]
impl SeriesProvider for FredClient {
    async fn fetch_series(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, AnalysisError> {
        self.get_observations(identifier, start, end).await
    }

    fn name(&self) -> &str {
        "fred"
    }
}

fn parse_observations(series_id: &str, body: ObservationsResponse) -> Result<Series, AnalysisError> {
    let points: Vec<(NaiveDate, f64)> = body
        .observations
        .into_iter()
        .filter_map(|obs| {
            // FRED reports missing observations as "."
            let value = obs.value.parse::<f64>().ok()?;
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").ok()?;
            Some((date, value))
        })
        .collect();

    if points.is_empty() {
        return Err(AnalysisError::Fetch(format!("No data found for {}", series_id)));
    }

    Ok(Series::from_points(series_id, points))
}

// FRED API types
#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct FredErrorResponse {
    error_message: String,
}
