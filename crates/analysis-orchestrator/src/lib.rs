use std::fmt;
use std::sync::Arc;

use analysis_core::{
    statistics, AnalysisError, AnalysisRequest, AnalysisResponse, DataSource, SeriesArchiver,
    StatisticsSummary,
};
use llm_client::NarrativeGenerator;
use market_data_client::CachedFetcher;

pub mod fork_join;
pub mod interpreter;

pub use fork_join::{fork_join, Task, TaskResult};
pub use interpreter::{interpret, ResolvedQuery};

/// Steps of a single analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Interpret,
    Fetch,
    Analyze,
    Archive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Interpret => "interpret",
            Stage::Fetch => "fetch",
            Stage::Analyze => "analyze",
            Stage::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Output of one concurrent analysis branch
enum AnalysisPart {
    Statistics(StatisticsSummary),
    Narrative(String),
}

/// Runs query → fetch → {statistics, narrative} → optional archive.
pub struct AnalysisOrchestrator {
    equity: CachedFetcher,
    macro_series: CachedFetcher,
    narrative: NarrativeGenerator,
    archiver: Arc<dyn SeriesArchiver>,
}

impl AnalysisOrchestrator {
    pub fn new(
        equity: CachedFetcher,
        macro_series: CachedFetcher,
        narrative: NarrativeGenerator,
        archiver: Arc<dyn SeriesArchiver>,
    ) -> Self {
        Self {
            equity,
            macro_series,
            narrative,
            archiver,
        }
    }

    pub fn fetcher(&self, source: DataSource) -> &CachedFetcher {
        match source {
            DataSource::Equity => &self.equity,
            DataSource::Macro => &self.macro_series,
        }
    }

    /// Perform the full analysis for one request.
    ///
    /// Any failure before archiving aborts the request with that error.
    /// Archiving never fails the request; a failed upload leaves the link empty.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        tracing::info!("Starting analysis for query {:?} ({} days)", request.query, request.days);

        let resolved = interpret(&request.query).map_err(|e| failed(Stage::Interpret, e))?;
        tracing::debug!(
            "Resolved query to {} series {}",
            resolved.source.label(),
            resolved.identifier
        );

        let series = self
            .fetcher(resolved.source)
            .fetch(&resolved.identifier, request.days)
            .await
            .map_err(|e| failed(Stage::Fetch, e))?;

        let stats_series = Arc::clone(&series);
        let narrative_series = Arc::clone(&series);
        let narrative = self.narrative.clone();
        let query = request.query.clone();

        let parts = fork_join(vec![
            Task::blocking(move || statistics::summarize(&stats_series).map(AnalysisPart::Statistics)),
            Task::spawn(async move {
                narrative
                    .generate(&query, &narrative_series)
                    .await
                    .map(AnalysisPart::Narrative)
            }),
        ])
        .await
        .map_err(|e| failed(Stage::Analyze, e))?;

        let mut statistics = None;
        let mut ai_analysis = None;
        for part in parts {
            match part {
                AnalysisPart::Statistics(s) => statistics = Some(s),
                AnalysisPart::Narrative(text) => ai_analysis = Some(text),
            }
        }
        let (Some(statistics), Some(ai_analysis)) = (statistics, ai_analysis) else {
            return Err(failed(
                Stage::Analyze,
                AnalysisError::Internal("analysis produced incomplete results".to_string()),
            ));
        };

        let google_drive_link = if request.use_google_drive {
            tracing::debug!("Entering {} stage for {}", Stage::Archive, series.symbol());
            self.archiver.archive(&series).await
        } else {
            None
        };

        tracing::info!(
            "Analysis complete for {} ({} points, archived: {})",
            series.symbol(),
            series.len(),
            google_drive_link.is_some()
        );

        Ok(AnalysisResponse {
            chart_data: series.chart_points(),
            statistics,
            ai_analysis,
            google_drive_link,
        })
    }
}

fn failed(stage: Stage, error: AnalysisError) -> AnalysisError {
    tracing::warn!("Analysis failed at {} stage: {}", stage, error);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{CompletionProvider, Series, SeriesProvider};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    struct StubProvider {
        name: &'static str,
        values: Vec<f64>,
        calls: AtomicUsize,
        last_identifier: std::sync::Mutex<Option<String>>,
    }

    impl StubProvider {
        fn new(name: &'static str, values: Vec<f64>) -> Arc<Self> {
            Arc::new(Self {
                name,
                values,
                calls: AtomicUsize::new(0),
                last_identifier: std::sync::Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SeriesProvider for StubProvider {
        async fn fetch_series(
            &self,
            identifier: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Series, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_identifier.lock().unwrap() = Some(identifier.to_string());
            let points = self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v))
                .collect();
            Ok(Series::from_points(identifier, points))
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct StubCompletion {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for StubCompletion {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<Vec<String>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AnalysisError::Narrative("Completion API error (503): overloaded".into()));
            }
            Ok(vec![" Prices trended upward. ".to_string()])
        }
    }

    struct StubArchiver {
        link: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SeriesArchiver for StubArchiver {
        async fn archive(&self, _series: &Series) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.link.clone()
        }
    }

    struct Harness {
        equity: Arc<StubProvider>,
        macro_series: Arc<StubProvider>,
        completion: Arc<StubCompletion>,
        archiver: Arc<StubArchiver>,
        orchestrator: AnalysisOrchestrator,
    }

    fn harness(equity_values: Vec<f64>, narrative_fails: bool, link: Option<&str>) -> Harness {
        let equity = StubProvider::new("equity", equity_values);
        let macro_series = StubProvider::new("macro", vec![3.7, 3.8, 3.9]);
        let completion = Arc::new(StubCompletion {
            fail: narrative_fails,
            calls: AtomicUsize::new(0),
        });
        let archiver = Arc::new(StubArchiver {
            link: link.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let orchestrator = AnalysisOrchestrator::new(
            CachedFetcher::new(equity.clone(), 100),
            CachedFetcher::new(macro_series.clone(), 100),
            NarrativeGenerator::new(completion.clone()),
            archiver.clone(),
        );
        Harness {
            equity,
            macro_series,
            completion,
            archiver,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_stock_query_full_response() {
        let h = harness(vec![100.0, 105.0, 110.0], false, None);
        let response = assert_ok!(h.orchestrator.analyze(&AnalysisRequest::new("stock aapl")).await);

        assert_eq!(h.equity.calls(), 1);
        assert_eq!(h.macro_series.calls(), 0);
        assert_eq!(h.equity.last_identifier.lock().unwrap().as_deref(), Some("AAPL"));
        assert_eq!(response.chart_data.len(), 3);
        assert_eq!(response.statistics.last_value, 110.0);
        assert!((response.statistics.pct_change - 10.0).abs() < 1e-9);
        assert_eq!(response.ai_analysis, "Prices trended upward.");
        assert!(response.google_drive_link.is_none());
        assert_eq!(h.archiver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fred_query_uses_macro_provider() {
        let h = harness(vec![1.0], false, None);
        let response = assert_ok!(h.orchestrator.analyze(&AnalysisRequest::new("fred UNRATE")).await);

        assert_eq!(h.macro_series.calls(), 1);
        assert_eq!(h.equity.calls(), 0);
        assert_eq!(h.macro_series.last_identifier.lock().unwrap().as_deref(), Some("UNRATE"));
        assert_eq!(response.statistics.last_value, 3.9);
    }

    #[tokio::test]
    async fn test_unrecognized_query_makes_no_calls() {
        let h = harness(vec![1.0], false, None);
        let err = assert_err!(h.orchestrator.analyze(&AnalysisRequest::new("how is the weather")).await);

        assert!(matches!(err, AnalysisError::Interpretation(_)));
        assert_eq!(h.equity.calls(), 0);
        assert_eq!(h.macro_series.calls(), 0);
        assert_eq!(h.completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_narrative_failure_fails_whole_request() {
        let h = harness(vec![1.0, 2.0], true, Some("https://drive.google.com/file/d/x/view"));
        let mut request = AnalysisRequest::new("stock AAPL");
        request.use_google_drive = true;

        let err = assert_err!(h.orchestrator.analyze(&request).await);
        assert_eq!(err.to_string(), "Completion API error (503): overloaded");
        assert_eq!(h.archiver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_statistics_failure_still_waits_for_narrative() {
        let h = harness(vec![], false, None);
        let err = assert_err!(h.orchestrator.analyze(&AnalysisRequest::new("stock AAPL")).await);

        assert!(matches!(err, AnalysisError::InsufficientData(_)));
        assert_eq!(h.completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_archive_link_included_when_requested() {
        let h = harness(vec![1.0, 2.0], false, Some("https://drive.google.com/file/d/abc/view"));
        let mut request = AnalysisRequest::new("stock AAPL");
        request.use_google_drive = true;

        let response = assert_ok!(h.orchestrator.analyze(&request).await);
        assert_eq!(
            response.google_drive_link.as_deref(),
            Some("https://drive.google.com/file/d/abc/view")
        );
    }

    #[tokio::test]
    async fn test_archive_failure_is_absorbed() {
        let h = harness(vec![1.0, 2.0], false, None);
        let mut request = AnalysisRequest::new("stock AAPL");
        request.use_google_drive = true;

        let response = assert_ok!(h.orchestrator.analyze(&request).await);
        assert!(response.google_drive_link.is_none());
        assert_eq!(h.archiver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeat_requests_reuse_cached_series() {
        let h = harness(vec![1.0, 2.0], false, None);
        let mut request = AnalysisRequest::new("stock AAPL");

        assert_ok!(h.orchestrator.analyze(&request).await);
        assert_ok!(h.orchestrator.analyze(&request).await);
        assert_eq!(h.equity.calls(), 1);

        request.days = 30;
        assert_ok!(h.orchestrator.analyze(&request).await);
        assert_eq!(h.equity.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_positive_days_is_a_fetch_error() {
        let h = harness(vec![1.0], false, None);
        let mut request = AnalysisRequest::new("stock AAPL");
        request.days = 0;

        let err = assert_err!(h.orchestrator.analyze(&request).await);
        assert!(matches!(err, AnalysisError::Fetch(_)));
        assert_eq!(h.equity.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_days_is_a_fetch_error() {
        let h = harness(vec![1.0], false, None);
        let mut request = AnalysisRequest::new("stock AAPL");
        request.days = 1_000_000_000;

        let err = assert_err!(h.orchestrator.analyze(&request).await);
        assert_eq!(err.to_string(), "Lookback window of 1000000000 days is out of range");
        assert_eq!(h.equity.calls(), 0);
        assert_eq!(h.completion.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Interpret.to_string(), "interpret");
        assert_eq!(Stage::Analyze.to_string(), "analyze");
    }
}
