//! Debian package repository front end.
//!
//! This crate serves an APT repository whose files live in an object store,
//! sending package downloads straight to matching release assets when the
//! client can follow a redirect:
//! - `/dists/...` requests pass a filename allow-list, then are redirected
//!   to a release asset or proxied to the origin with a response cache
//! - Every other path is served from a static site directory
//! - Prometheus metrics are exposed on a separate listener
//!
//! # Architecture
//!
//! The server uses a library-first design with the following components:
//! - `server`: Main server orchestration (listeners, refresher supervision)
//! - `config`: Configuration loading and validation
//! - `proxy`: Caching reverse proxy to the origin
//! - `http`: HTTP routers and handlers
//!
//! The catalog, redirect decision and metrics live in `aptweb-redirect`; the
//! response cache lives in `aptweb-cache`.
//!
//! # Example
//!
//! ```no_run
//! use aptweb_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Initialize logging
//!     tracing_subscriber::fmt::init();
//!
//!     // Load configuration from CLI args and environment
//!     let config = ServerConfig::from_args();
//!     config.validate()?;
//!
//!     // Create and run server
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod server;

pub use config::ServerConfig;
pub use error::{ConfigError, ServerError};
pub use proxy::{CachedResponse, CachingProxy};
pub use server::{AppState, Server, supervise_refresher};
