//! HTTP retrieval of raw page markup.
//!
//! [`Fetch`] is the seam the cache calls through; [`HttpFetcher`] is the
//! real implementation. Tests substitute fakes that count calls.

use crate::error::FetchError;
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Anything that can turn a URL into page text.
pub trait Fetch {
    /// Fetch `url` and return its body.
    ///
    /// Non-success statuses are errors; nothing is retried.
    ///
    /// # Errors
    ///
    /// [`FetchError::Status`] for a non-2xx response, [`FetchError::Transport`]
    /// when the request or body read fails.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages with `reqwest`, sending a fixed `User-Agent` on every request.
///
/// No timeout is set and redirects follow the client default.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher backed by a single `reqwest` client.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Sent as the `User-Agent` header on every request
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the TLS backend cannot be initialized.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        debug!(%status, "Received response");
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(transport)?;
        info!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
