pub mod narrative;
pub mod openai;
pub mod prompt;

pub use narrative::NarrativeGenerator;
pub use openai::OpenAiClient;
pub use prompt::build_prompt;

use std::time::Duration;

pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the completion provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Whole-request timeout for completion calls; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo-instruct".to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}
