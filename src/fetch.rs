//! HTTP fetch collaborator.
//!
//! The pipeline only needs "URL in, bytes out"; [`Fetch`] is that seam, and
//! [`HttpFetcher`] is the `reqwest` implementation used by the binary.

use crate::error::{NewsError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

const USER_AGENT: &str = concat!("headline_digest/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieve raw page bytes.
pub trait Fetch {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NewsError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let t0 = Instant::now();
        let fetch_error = |reason: String| NewsError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Non-success status");
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        debug!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory fetcher keyed by absolute URL; unknown URLs fail like a 404.
    #[derive(Debug, Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, Vec<u8>>,
        pub requested: RefCell<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.as_bytes().to_vec());
            self
        }
    }

    impl Fetch for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages.get(url.as_str()).cloned().ok_or_else(|| NewsError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticFetcher;
    use super::*;

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new().is_ok());
    }

    #[tokio::test]
    async fn test_static_fetcher_serves_and_records() {
        let fetcher = StaticFetcher::default().with_page("https://example.com/", "<p>hi</p>");
        let ok = fetcher.fetch(&Url::parse("https://example.com/").unwrap()).await;
        assert_eq!(ok.unwrap(), b"<p>hi</p>".to_vec());

        let missing = fetcher
            .fetch(&Url::parse("https://example.com/missing").unwrap())
            .await;
        assert!(matches!(missing, Err(NewsError::Fetch { .. })));
        assert_eq!(fetcher.requested.borrow().len(), 2);
    }
}
