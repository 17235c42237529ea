use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::{ArchiveError, DRIVE_SCOPE};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth2 "authorized user" credentials as written by Google's client libraries.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl AuthorizedUser {
    pub async fn load(path: &Path) -> Result<Self, ArchiveError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ArchiveError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let creds: Self = serde_json::from_str(raw)
            .map_err(|e| ArchiveError::Credentials(format!("invalid credential file: {}", e)))?;

        if creds.token.is_none() && !creds.can_refresh() {
            return Err(ArchiveError::Credentials(
                "credential file has neither an access token nor refresh credentials".into(),
            ));
        }
        Ok(creds)
    }

    fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Stored access token, if present and not within a minute of expiring.
    pub fn stored_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref()?;
        match self.expiry.as_deref() {
            None => Some(token),
            Some(expiry) => {
                let expiry = DateTime::parse_from_rfc3339(expiry).ok()?.with_timezone(&Utc);
                (expiry - Duration::seconds(60) > now).then_some(token)
            }
        }
    }

    /// A usable bearer token, exchanging the refresh token when needed.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, ArchiveError> {
        if let Some(token) = self.stored_token(Utc::now()) {
            return Ok(token.to_string());
        }

        let (Some(refresh_token), Some(client_id), Some(client_secret)) =
            (&self.refresh_token, &self.client_id, &self.client_secret)
        else {
            return Err(ArchiveError::Credentials(
                "access token expired and no refresh credentials available".into(),
            ));
        };

        let token_uri = self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
        tracing::debug!("Refreshing Google OAuth access token");

        let response = client
            .post(token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", DRIVE_SCOPE),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ArchiveError::Api(format!(
                "token refresh failed: HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}
