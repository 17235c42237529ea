use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upstream provider a query resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Daily closing prices for an equity ticker
    Equity,
    /// Dated observations of a macroeconomic series (FRED)
    Macro,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Equity => "equity",
            DataSource::Macro => "macro",
        }
    }
}

/// A dated numeric series for one instrument or economic series.
///
/// Built from `(date, value)` pairs, so `dates` and `values` are always the
/// same length. Dates are expected to be ascending but that is not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    symbol: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    pub fn from_points(symbol: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        let (dates, values) = points.into_iter().unzip();
        Self {
            symbol: symbol.into(),
            dates,
            values,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Chart-ready `{date, value}` pairs in series order.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.points()
            .map(|(date, value)| ChartPoint { date, value })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChartPoint {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2024-01-02"))]
    pub date: NaiveDate,
    pub value: f64,
}

/// Descriptive statistics over a series' values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatisticsSummary {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub last_value: f64,
    /// `(last / first - 1) * 100`, or 0 with fewer than two observations
    pub pct_change: f64,
}

/// Incoming analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisRequest {
    pub query: String,
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default)]
    pub use_google_drive: bool,
}

fn default_days() -> i64 {
    365
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            days: default_days(),
            use_google_drive: false,
        }
    }
}

/// Combined result returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisResponse {
    #[serde(rename = "chartData")]
    pub chart_data: Vec<ChartPoint>,
    pub statistics: StatisticsSummary,
    #[serde(rename = "aiAnalysis")]
    pub ai_analysis: String,
    pub google_drive_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_series_keeps_points_parallel() {
        let series = Series::from_points("AAPL", vec![(date("2024-01-02"), 1.0), (date("2024-01-03"), 2.0)]);
        assert_eq!(series.dates().len(), series.values().len());
        assert_eq!(series.len(), 2);
        assert_eq!(series.points().last(), Some((date("2024-01-03"), 2.0)));
    }

    #[test]
    fn test_chart_points_serialize_as_iso_dates() {
        let series = Series::from_points("AAPL", vec![(date("2024-01-02"), 185.5)]);
        let json = serde_json::to_value(series.chart_points()).unwrap();
        assert_eq!(json, serde_json::json!([{ "date": "2024-01-02", "value": 185.5 }]));
    }

    #[test]
    fn test_request_defaults() {
        let req: AnalysisRequest = serde_json::from_str(r#"{"query": "stock AAPL"}"#).unwrap();
        assert_eq!(req.days, 365);
        assert!(!req.use_google_drive);
    }

    #[test]
    fn test_response_field_names() {
        let response = AnalysisResponse {
            chart_data: vec![],
            statistics: StatisticsSummary {
                mean: 1.0,
                std: 0.0,
                min: 1.0,
                max: 1.0,
                last_value: 1.0,
                pct_change: 0.0,
            },
            ai_analysis: "flat".to_string(),
            google_drive_link: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("chartData").is_some());
        assert!(json.get("aiAnalysis").is_some());
        assert!(json["google_drive_link"].is_null());
        assert!(json["statistics"].get("last_value").is_some());
    }
}
