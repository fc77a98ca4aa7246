use crate::ebay::config::oauth_token_url;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Tokens are refreshed this long before eBay says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TTL_SECS: u64 = 7200;

#[derive(Debug, Error)]
pub enum EbayAuthError {
    #[error("missing ebay app credentials in env")]
    MissingCredentials,
    #[error("oauth request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

impl AppCredentials {
    pub fn is_complete(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.app_secret.trim().is_empty()
    }

    fn basic_auth_header(&self) -> Result<String, EbayAuthError> {
        if !self.is_complete() {
            return Err(EbayAuthError::MissingCredentials);
        }
        let raw = format!("{}:{}", self.app_id, self.app_secret);
        Ok(format!("Basic {}", BASE64.encode(raw)))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppToken {
    pub access_token: String,
    refresh_at: Instant,
}

impl AppToken {
    pub fn new(access_token: String, expires_in: Duration) -> Self {
        Self {
            access_token,
            refresh_at: Instant::now() + expires_in.saturating_sub(EXPIRY_MARGIN),
        }
    }

    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

/// Client-credentials grant for an application token.
pub async fn get_app_access_token(
    client: &Client,
    root: &str,
    credentials: &AppCredentials,
    scopes: &[&str],
) -> Result<AppToken, EbayAuthError> {
    let header = credentials.basic_auth_header()?;
    let scope = scopes.join(" ");
    let body = [("grant_type", "client_credentials"), ("scope", scope.as_str())];

    let response = client
        .post(oauth_token_url(root))
        .header(reqwest::header::AUTHORIZATION, header)
        .form(&body)
        .send()
        .await
        .map_err(|err| EbayAuthError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(EbayAuthError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    let payload: TokenResponse = response
        .json()
        .await
        .map_err(|err| EbayAuthError::Request(err.to_string()))?;
    Ok(AppToken::new(
        payload.access_token,
        Duration::from_secs(payload.expires_in.unwrap_or(DEFAULT_TTL_SECS)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_header_encodes_credentials() {
        let credentials = AppCredentials {
            app_id: "app".into(),
            app_secret: "secret".into(),
        };
        assert_eq!(
            credentials.basic_auth_header().expect("header"),
            "Basic YXBwOnNlY3JldA=="
        );
    }

    #[test]
    fn incomplete_credentials_are_rejected() {
        let credentials = AppCredentials {
            app_id: "app".into(),
            app_secret: " ".into(),
        };
        assert!(matches!(
            credentials.basic_auth_header(),
            Err(EbayAuthError::MissingCredentials)
        ));
    }

    #[test]
    fn token_expires_before_reported_lifetime() {
        assert!(AppToken::new("t".into(), Duration::from_secs(7200)).is_fresh());
        assert!(!AppToken::new("t".into(), Duration::from_secs(30)).is_fresh());
    }
}
