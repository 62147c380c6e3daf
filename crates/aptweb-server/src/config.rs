//! Server configuration management.
//!
//! Configuration is loaded from CLI arguments with environment variable
//! fallbacks (`APTWEB_*`) and validated before the server starts.
//!
//! # Example
//!
//! ```no_run
//! use aptweb_server::ServerConfig;
//!
//! let config = ServerConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("HTTP server will bind to: {}", config.http_bind);
//! println!("Release feeds: {:?}", config.release_feeds);
//! ```

use crate::error::ConfigError;
use aptweb_cache::TtlCacheConfig;
use aptweb_redirect::{FeedConfig, FilenameFilter};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "aptweb",
    about = "Debian package repository front end with release-asset redirects",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "APTWEB_HTTP_BIND", default_value = "0.0.0.0:8080")]
    pub http_bind: SocketAddr,

    /// Metrics bind address
    #[arg(long, env = "APTWEB_METRICS_BIND", default_value = "0.0.0.0:8081")]
    pub metrics_bind: SocketAddr,

    /// Origin object store serving the repository
    #[arg(
        long,
        env = "APTWEB_DISTS_HOST",
        default_value = "https://syncthing-apt.s3.fr-par.scw.cloud"
    )]
    pub dists_host: String,

    /// Release feed URL(s), comma-separated; fetched in order
    #[arg(
        long = "release-feed",
        env = "APTWEB_RELEASE_FEEDS",
        value_delimiter = ',',
        default_values = [
            "https://api.github.com/repos/syncthing/syncthing/releases?per_page=15",
            "https://api.github.com/repos/syncthing/discosrv/releases?per_page=5",
            "https://api.github.com/repos/syncthing/relaysrv/releases?per_page=5",
        ]
    )]
    pub release_feeds: Vec<String>,

    /// Seconds between catalog rebuilds
    #[arg(long, env = "APTWEB_REFRESH_INTERVAL_SECS", default_value_t = 300)]
    pub refresh_interval_secs: u64,

    /// Seconds to wait before restarting a failed refresher
    #[arg(long, env = "APTWEB_RESTART_DELAY_SECS", default_value_t = 15)]
    pub restart_delay_secs: u64,

    /// Timeout in seconds for one release feed fetch
    #[arg(long, env = "APTWEB_FEED_TIMEOUT_SECS", default_value_t = 30)]
    pub feed_timeout_secs: u64,

    /// Seconds an origin response stays cached
    #[arg(long, env = "APTWEB_CACHE_TTL_SECS", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached origin responses
    #[arg(long, env = "APTWEB_CACHE_CAPACITY", default_value_t = 100)]
    pub cache_capacity: usize,

    /// Largest origin response body that is cached, in bytes
    #[arg(long, env = "APTWEB_CACHE_MAX_ENTRY_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub cache_max_entry_bytes: usize,

    /// Allowed file name pattern(s) under /dists/, comma-separated
    #[arg(
        long = "allowed-name",
        env = "APTWEB_ALLOWED_NAMES",
        value_delimiter = ',',
        default_values = [
            "*.deb",
            "InRelease",
            "InRelease.gz",
            "Release",
            "Release.gz",
            "Release.gpg",
            "Release.gpg.gz",
            "Packages",
            "Packages.gz",
        ]
    )]
    pub allowed_names: Vec<String>,

    /// Directory with the static site
    #[arg(long, env = "APTWEB_SITE_DIR", default_value = "./site")]
    pub site_dir: PathBuf,

    /// Emit logs as JSON
    #[arg(long, env = "APTWEB_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Interval between catalog rebuilds.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Delay before a failed refresher is restarted.
    #[must_use]
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// Feed client settings.
    #[must_use]
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            timeout: Duration::from_secs(self.feed_timeout_secs),
            ..FeedConfig::default()
        }
    }

    /// Response cache settings.
    #[must_use]
    pub fn cache_config(&self) -> TtlCacheConfig {
        TtlCacheConfig::new()
            .with_max_entries(self.cache_capacity)
            .with_ttl(Duration::from_secs(self.cache_ttl_secs))
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `dists_host` does not parse.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.dists_host).map_err(|source| ConfigError::InvalidUrl {
            url: self.dists_host.clone(),
            source,
        })
    }

    /// Compiled filename allow-list.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for an invalid glob.
    pub fn filename_filter(&self) -> Result<FilenameFilter, ConfigError> {
        Ok(FilenameFilter::new(&self.allowed_names)?)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - No release feed is configured, or a feed URL does not parse
    /// - The origin is not an http(s) URL
    /// - An interval, timeout or cache limit is zero
    /// - An allowed name is not a valid glob
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.release_feeds.is_empty() {
            return Err(ConfigError::MissingRequired(
                "at least one release feed".to_string(),
            ));
        }

        for feed in &self.release_feeds {
            Url::parse(feed).map_err(|source| ConfigError::InvalidUrl {
                url: feed.clone(),
                source,
            })?;
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "dists_host",
                reason: format!("unsupported scheme '{}'", origin.scheme()),
            });
        }

        for (field, value) in [
            ("refresh_interval_secs", self.refresh_interval_secs),
            ("feed_timeout_secs", self.feed_timeout_secs),
            ("cache_ttl_secs", self.cache_ttl_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                });
            }
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache_capacity",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.allowed_names.is_empty() {
            return Err(ConfigError::MissingRequired(
                "at least one allowed file name".to_string(),
            ));
        }
        self.filename_filter()?;

        if !self.site_dir.is_dir() {
            tracing::warn!(
                "Static site directory {} not found; only /dists/ will be served",
                self.site_dir.display()
            );
        }

        Ok(())
    }
}
