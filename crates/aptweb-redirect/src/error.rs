//! Error types for the redirect layer

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while fetching or decoding a release feed.
///
/// Any of these aborts the catalog build in progress; nothing partial is
/// ever published.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Failed to fetch release feed {url}: {source}")]
    Http {
        /// Feed URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Feed answered with a non-2xx status
    #[error("Release feed {url} returned HTTP {status}")]
    Status {
        /// Feed URL
        url: String,
        /// Status returned by the feed
        status: StatusCode,
    },

    /// Feed body was not a JSON array of releases
    #[error("Invalid JSON in release feed {url}: {source}")]
    Decode {
        /// Feed URL
        url: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// HTTP client could not be constructed
    #[error("Failed to build feed HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised while compiling the filename allow-list.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A pattern is not a valid shell glob
    #[error("Invalid filename pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Underlying glob error
        #[source]
        source: glob::PatternError,
    },
}

/// Result alias for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
