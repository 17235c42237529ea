use analysis_core::{AnalysisError, CompletionProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::LlmConfig;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for an OpenAI-compatible `/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Self {
        if config.api_key.trim().is_empty() {
            tracing::warn!("OpenAI API key is empty; narrative generation will fail");
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>, AnalysisError> {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
        };

        tracing::debug!("Requesting completion from {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(format!("{}/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Narrative(format!("Completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Narrative(error_message(status.as_u16(), &text)));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Narrative(format!("Invalid completion response: {}", e)))?;

        Ok(body.choices.into_iter().map(|c| c.text).collect())
    }
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => format!("Completion API error ({}): {}", status, parsed.error.message),
        Err(_) => format!("Completion API error ({}): {}", status, body),
    }
}
