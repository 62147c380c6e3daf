//! Error types for cache operations

use thiserror::Error;

/// Errors that can occur when constructing or operating a cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
