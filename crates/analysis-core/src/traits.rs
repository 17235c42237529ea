use async_trait::async_trait;
use chrono::NaiveDate;
use crate::{AnalysisError, Series};

/// Trait for time-series data providers (equity prices, macro series)
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Daily observations for `identifier` between `start` and `end`, inclusive.
    async fn fetch_series(
        &self,
        identifier: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, AnalysisError>;

    fn name(&self) -> &str;
}

/// Trait for language-model text completion backends
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt`, returning the text of every choice.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>, AnalysisError>;
}

/// Trait for best-effort series archiving
#[async_trait]
pub trait SeriesArchiver: Send + Sync {
    /// Upload the series, returning a shareable link. Failures yield `None`.
    async fn archive(&self, series: &Series) -> Option<String>;
}
