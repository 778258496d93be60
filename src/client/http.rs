//! HTTP client for the remote console endpoints.
//!
//! Two plain-text resources: `GET /query/<command>` executes a raw console
//! command, `GET /cmd/?cmd=<name>&val=<value>` fires a named action. Both
//! return literal text to display.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::ServerConfig;
use crate::console::RequestOutcome;

/// Errors from the console endpoints.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL: {0}")]
    BadBaseUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Http(reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
}

impl ClientError {
    /// Map into the transcript-facing outcome. Timeouts render distinctly
    /// from other failures.
    pub fn into_outcome(self) -> RequestOutcome {
        match self {
            ClientError::Timeout => RequestOutcome::TimedOut,
            other => RequestOutcome::NetworkFailure(other.to_string()),
        }
    }
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(err)
    }
}

/// Client for a single remote console server.
pub struct ConsoleClient {
    base: Url,
    http: Client,
}

impl ConsoleClient {
    pub fn new(server: &ServerConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&server.base_url)
            .map_err(|_| ClientError::BadBaseUrl(server.base_url.clone()))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(server.request_timeout_secs))
            .build()
            .map_err(ClientError::Http)?;
        Ok(Self { base, http })
    }

    /// Send a raw console command to the query endpoint and return the
    /// response body as text.
    pub async fn query(&self, command: &str) -> Result<String, ClientError> {
        let url = query_url(&self.base, command)?;
        debug!(%url, "sending query");
        self.fetch_text(url).await
    }

    /// Fire a named action on the command endpoint and return the status
    /// text.
    pub async fn action(&self, cmd: &str, val: i64) -> Result<String, ClientError> {
        let url = action_url(&self.base, cmd, val)?;
        debug!(%url, "sending action");
        self.fetch_text(url).await
    }

    async fn fetch_text(&self, url: Url) -> Result<String, ClientError> {
        let response = self.http.get(url).send().await.map_err(classify)?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        response.text().await.map_err(classify)
    }
}

/// Build `<base>/query/<command>` with the command percent-encoded as a
/// single path segment.
pub fn query_url(base: &Url, command: &str) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::BadBaseUrl(base.to_string()))?
        .pop_if_empty()
        .push("query")
        .push(command);
    Ok(url)
}

/// Build `<base>/cmd/?cmd=<name>&val=<value>`.
pub fn action_url(base: &Url, cmd: &str, val: i64) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::BadBaseUrl(base.to_string()))?
        .pop_if_empty()
        .push("cmd")
        .push("");
    url.query_pairs_mut()
        .append_pair("cmd", cmd)
        .append_pair("val", &val.to_string());
    Ok(url)
}
