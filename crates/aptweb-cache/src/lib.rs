//! Bounded-capacity TTL cache for aptweb.
//!
//! The origin proxy in `aptweb-server` keeps successful responses here so
//! repeated metadata requests (`InRelease`, `Packages.gz`, ...) do not hit the
//! object store on every poll from an APT client.
//!
//! # Example
//!
//! ```
//! use aptweb_cache::{TtlCache, TtlCacheConfig};
//! use std::time::Duration;
//!
//! let config = TtlCacheConfig::new()
//!     .with_max_entries(100)
//!     .with_ttl(Duration::from_secs(300));
//! let cache: TtlCache<String, Vec<u8>> = TtlCache::new(config).unwrap();
//!
//! cache.insert("https://origin/dists/stable/InRelease".to_string(), b"data".to_vec());
//! assert!(cache.get(&"https://origin/dists/stable/InRelease".to_string()).is_some());
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod stats;
pub mod ttl_cache;

pub use config::TtlCacheConfig;
pub use error::{CacheError, CacheResult};
pub use stats::CacheStats;
pub use ttl_cache::TtlCache;
