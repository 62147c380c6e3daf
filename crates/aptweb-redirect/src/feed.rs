//! HTTP client for upstream release feeds.

use crate::asset::Release;
use crate::error::{FeedError, Result};
use reqwest::{Client, header};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring provider for rustls once per process.
///
/// reqwest is built without a default provider, so one must be in place
/// before the first TLS connection.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Err means another provider was installed first, which is fine
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Feed client configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Whole-request timeout for one feed fetch
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// User-Agent sent to the feed (GitHub rejects requests without one)
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("aptweb/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches and decodes release feeds.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Create a new feed client.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Client` if the HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        ensure_crypto_provider();

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self { client })
    }

    /// GET one feed and decode it as a JSON array of releases.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` on transport failure, non-2xx status, or a body
    /// that is not a release array.
    pub async fn fetch_releases(&self, url: &str) -> Result<Vec<Release>> {
        tracing::debug!(feed = %url, "fetching release feed");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| FeedError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| FeedError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| FeedError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
