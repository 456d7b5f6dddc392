//! Channel page retrieval.
//!
//! Fetches the public web view of a channel over HTTP, or reads a page saved
//! earlier. The raw body is returned together with its status so callers can
//! archive it before deciding whether the status is acceptable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{RelayError, Result};

/// HTTP client configuration shared by page fetches and media downloads.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: concat!("eitaa-relay/", env!("CARGO_PKG_VERSION")).to_string() }
    }
}

impl FetchConfig {
    pub(crate) fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(&self.user_agent)
            .build()
            .map_err(RelayError::HttpError)
    }

    pub(crate) fn map_send_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() { RelayError::Timeout { timeout: self.timeout } } else { RelayError::HttpError(e) }
    }
}

/// A fetched page body and the status it was served with.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body, or [`RelayError::HttpStatus`] for a non-2xx status.
    pub fn into_body(self) -> Result<String> {
        if self.is_success() { Ok(self.body) } else { Err(RelayError::HttpStatus { status: self.status }) }
    }
}

/// Public page URL of a channel, e.g. `https://eitaa.com/news`.
pub fn channel_url(base_url: &Url, username: &str) -> Result<Url> {
    let username = username.trim().trim_start_matches('@');
    if username.is_empty() || username.contains('/') {
        return Err(RelayError::InvalidUrl(format!("invalid channel username: {:?}", username)));
    }
    base_url.join(&format!("/{}", username)).map_err(|e| RelayError::InvalidUrl(e.to_string()))
}

/// Fetches a channel page without judging its status.
pub async fn fetch_channel_page(url: &Url, config: &FetchConfig) -> Result<FetchedPage> {
    let client = config.client()?;

    let response = client
        .get(url.clone())
        .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| config.map_send_error(e))?;

    let status = response.status().as_u16();
    let body = response.text().await?;
    tracing::debug!(url = %url, status, bytes = body.len(), "fetched channel page");

    Ok(FetchedPage { status, body })
}

/// Reads a saved channel page from disk.
pub fn fetch_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        Err(RelayError::FileNotFound(PathBuf::from(path)))
    } else {
        fs::read_to_string(path).map_err(RelayError::from)
    }
}

/// Saves the raw page body for later inspection.
pub fn archive_page(path: impl AsRef<Path>, body: &str) -> Result<()> {
    fs::write(path, body)?;
    Ok(())
}
