//! Best-effort archiving of fetched series to Google Drive.

mod credentials;

pub use credentials::AuthorizedUser;

use std::path::PathBuf;

use analysis_core::{Series, SeriesArchiver};
use async_trait::async_trait;
use serde::Deserialize;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const BOUNDARY: &str = "finquery_series_boundary";

/// Errors from the archiving path. Never leave this crate.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Credential error: {0}")]
    Credentials(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Drive API error: {0}")]
    Api(String),
}

/// Configuration for the Drive archiver.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub token_path: PathBuf,
    pub upload_url: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            upload_url: UPLOAD_URL.to_string(),
        }
    }
}

impl DriveConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self {
            token_path: std::env::var("GOOGLE_TOKEN_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("token.json")),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

/// Uploads a series as `{symbol}_data.csv` and returns its view link.
pub struct DriveArchiver {
    config: DriveConfig,
    client: reqwest::Client,
}

impl DriveArchiver {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Upload the series, surfacing the failure reason.
    pub async fn upload(&self, series: &Series) -> Result<String, ArchiveError> {
        let creds = AuthorizedUser::load(&self.config.token_path).await?;
        let access_token = creds.access_token(&self.client).await?;

        let file_name = file_name(series);
        let body = multipart_body(&file_name, &to_csv(series));

        let response = self
            .client
            .post(&self.config.upload_url)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ArchiveError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let file: UploadedFile = response.json().await?;
        tracing::info!("Archived {} to Google Drive as {}", file_name, file.id);
        Ok(view_link(&file.id))
    }
}

#[async_trait]
impl SeriesArchiver for DriveArchiver {
    async fn archive(&self, series: &Series) -> Option<String> {
        match self.upload(series).await {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::warn!("Error saving {} to Google Drive: {}", series.symbol(), e);
                None
            }
        }
    }
}

pub fn file_name(series: &Series) -> String {
    format!("{}_data.csv", series.symbol())
}

/// `date,value` lines joined by newlines, no header. Whole values keep their
/// decimal point (`100.0`).
pub fn to_csv(series: &Series) -> String {
    series
        .points()
        .map(|(date, value)| format!("{},{:?}", date.format("%Y-%m-%d"), value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn view_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/view", file_id)
}

fn multipart_body(file_name: &str, csv: &str) -> String {
    let metadata = serde_json::json!({ "name": file_name });
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
         --{b}\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--",
        b = BOUNDARY,
        meta = metadata,
        csv = csv,
    )
}
