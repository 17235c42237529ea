use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use drive_archiver::DriveConfig;
use llm_client::{LlmConfig, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS};
use market_data_client::DEFAULT_CACHE_CAPACITY;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: String,

    // External APIs
    pub fred_api_key: String,
    pub llm: LlmConfig,
    pub drive: DriveConfig,

    pub cache_capacity: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse()
                .context("BIND_ADDR must be a socket address like 0.0.0.0:8000")?,
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            fred_api_key: env::var("FRED_API_KEY").unwrap_or_default(),
            llm: LlmConfig {
                max_tokens: env::var("OPENAI_MAX_TOKENS")
                    .unwrap_or_else(|_| DEFAULT_MAX_TOKENS.to_string())
                    .parse()
                    .context("OPENAI_MAX_TOKENS must be a positive integer")?,
                timeout: completion_timeout(
                    &env::var("OPENAI_TIMEOUT_SECS")
                        .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string()),
                )?,
                ..LlmConfig::default()
            },
            drive: DriveConfig::from_env(),
            cache_capacity: env::var("SERIES_CACHE_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_CACHE_CAPACITY.to_string())
                .parse()
                .context("SERIES_CACHE_CAPACITY must be a positive integer")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.llm.max_tokens == 0 {
            anyhow::bail!("OPENAI_MAX_TOKENS must be greater than zero");
        }
        if self.cache_capacity == 0 {
            anyhow::bail!("SERIES_CACHE_CAPACITY must be greater than zero");
        }
        Ok(())
    }
}

/// Seconds to wait on the completion provider; `0` disables the timeout.
fn completion_timeout(raw: &str) -> Result<Option<Duration>> {
    let secs: u64 = raw
        .trim()
        .parse()
        .context("OPENAI_TIMEOUT_SECS must be a non-negative integer")?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
