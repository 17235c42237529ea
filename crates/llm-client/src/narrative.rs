use std::sync::Arc;

use analysis_core::{AnalysisError, CompletionProvider, Series};

use crate::{build_prompt, DEFAULT_MAX_TOKENS};

/// Turns a query plus fetched series into free-text commentary.
#[derive(Clone)]
pub struct NarrativeGenerator {
    provider: Arc<dyn CompletionProvider>,
    max_tokens: u32,
}

impl NarrativeGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Trimmed text of the first completion choice. Provider errors propagate as-is.
    pub async fn generate(&self, query: &str, series: &Series) -> Result<String, AnalysisError> {
        let prompt = build_prompt(query, series);
        let choices = self.provider.complete(&prompt, self.max_tokens).await?;

        choices
            .into_iter()
            .next()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| AnalysisError::Narrative("Completion returned no choices".to_string()))
    }
}
