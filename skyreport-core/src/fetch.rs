use async_trait::async_trait;
use reqwest::{Client, Url};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, warn};

use crate::error::Error;

/// Status and body of one HTTP exchange. The body is kept even for
/// non-success statuses, since the weather API reports errors in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retrieves the raw bytes behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    async fn fetch(&self, url: &Url) -> Result<RawResponse, Error>;
}

/// [`Fetcher`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawResponse, Error> {
        // The query may carry the API key, so only the path is logged.
        debug!(
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            "sending weather request"
        );

        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                Error::Transport(format!("Failed to send request to weather API: {e}"))
            })?;

        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|e| {
                Error::Transport(format!("Failed to read weather API response body: {e}"))
            })?;

        if !status.is_success() {
            warn!(%status, "weather API answered with a non-success status");
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

/// First `MAX` characters of a body, for error messages.
pub(crate) fn truncate_body(body: &[u8]) -> String {
    const MAX: usize = 200;

    let text = String::from_utf8_lossy(body);
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.into_owned()
    }
}
