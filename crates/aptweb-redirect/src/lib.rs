//! Release-asset redirect layer for a Debian package repository.
//!
//! Package files (`*.deb`) that are also published as release assets upstream
//! can be served by redirecting the client to the asset's download URL instead
//! of streaming the file through the repository proxy. This crate decides,
//! per request, whether that redirect is possible.
//!
//! # Architecture
//!
//! - `asset`: release feed data model
//! - `feed`: HTTP client for release feeds
//! - `builder`: merges feeds into a catalog, excluding colliding names
//! - `catalog`: immutable name to asset mapping
//! - `store`: atomic snapshot publication
//! - `refresher`: periodic rebuild task
//! - `filter`: filename allow-list
//! - `compat`: APT client compatibility heuristic
//! - `dispatch`: per-request redirect decision
//! - `metrics`: Prometheus counters and gauges
//!
//! # Example
//!
//! ```no_run
//! use aptweb_redirect::{
//!     CatalogBuilder, CatalogRefresher, CatalogStore, Dispatch, FeedClient, FeedConfig,
//!     RedirectMetrics, Redirector,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = RedirectMetrics::new()?;
//!     let store = Arc::new(CatalogStore::new());
//!     let builder = CatalogBuilder::new(
//!         vec!["https://api.github.com/repos/syncthing/syncthing/releases?per_page=15".into()],
//!         FeedClient::new(&FeedConfig::default())?,
//!     );
//!
//!     let refresher = CatalogRefresher::new(
//!         builder,
//!         Arc::clone(&store),
//!         Duration::from_secs(300),
//!         metrics.clone(),
//!     );
//!     tokio::spawn(async move { refresher.run(CancellationToken::new()).await });
//!
//!     let redirector = Redirector::new(store, metrics);
//!     match redirector.dispatch("/dists/syncthing_1.27.0_amd64.deb", Some("curl/8.0")) {
//!         Dispatch::Redirect(target) => println!("307 -> {}", target.url),
//!         Dispatch::Proxy(reason) => println!("proxy ({})", reason.as_label()),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod asset;
pub mod builder;
pub mod catalog;
pub mod compat;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod filter;
pub mod metrics;
pub mod refresher;
pub mod store;

pub use asset::{Asset, Release};
pub use builder::{CatalogBuilder, CatalogMerger};
pub use catalog::Catalog;
pub use compat::is_redirect_incompatible;
pub use dispatch::{Dispatch, RedirectTarget, Redirector};
pub use error::{FeedError, FilterError};
pub use feed::{FeedClient, FeedConfig, ensure_crypto_provider};
pub use filter::{DEFAULT_ALLOWED_NAMES, FilenameFilter};
pub use metrics::{FallbackReason, RedirectMetrics};
pub use refresher::CatalogRefresher;
pub use store::CatalogStore;
