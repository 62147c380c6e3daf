//! Error types for the aptweb server.
//!
//! All errors use thiserror; the binary wraps them in `anyhow`.

use aptweb_cache::CacheError;
use aptweb_redirect::{FeedError, FilterError};
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric or list option has an unusable value
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Option name
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// A URL option does not parse
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// A filename pattern is not a valid glob
    #[error(transparent)]
    InvalidPattern(#[from] FilterError),

    /// Missing required configuration value
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the HTTP listener
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    HttpBindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to bind the metrics listener
    #[error("Failed to bind metrics server to {addr}: {source}")]
    MetricsBindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Release feed client error
    #[error("Release feed error: {0}")]
    Feed(#[from] FeedError),

    /// Response cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Origin HTTP client could not be built
    #[error("Failed to build origin HTTP client: {0}")]
    OriginClient(#[source] reqwest::Error),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}
