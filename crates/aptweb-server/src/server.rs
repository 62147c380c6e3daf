//! Server state management and orchestration.
//!
//! Owns the published catalog, the refresher task, the origin proxy and both
//! HTTP listeners, and ties their lifetimes to one shutdown token.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::proxy::CachingProxy;
use aptweb_redirect::{
    CatalogBuilder, CatalogRefresher, CatalogStore, FeedClient, FilenameFilter, RedirectMetrics,
    Redirector,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;

/// Shared application state for the HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Redirect decision against the published catalog
    redirector: Redirector,

    /// Filename allow-list for `/dists/`
    filter: FilenameFilter,

    /// Caching proxy to the origin
    proxy: CachingProxy,

    /// Server start time
    started_at: SystemTime,
}

impl AppState {
    /// Create application state reading from `store`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the origin URL, filename patterns or proxy
    /// cache are invalid.
    pub fn new(
        config: &ServerConfig,
        store: Arc<CatalogStore>,
        metrics: RedirectMetrics,
    ) -> Result<Self, ServerError> {
        let filter = config.filename_filter()?;
        let proxy = CachingProxy::new(
            config.origin_url()?,
            config.cache_config(),
            config.cache_max_entry_bytes,
        )?;

        tracing::info!(
            "Proxying {} with {} allowed name patterns",
            proxy.origin(),
            filter.patterns().count()
        );

        Ok(Self {
            redirector: Redirector::new(store, metrics),
            filter,
            proxy,
            started_at: SystemTime::now(),
        })
    }

    /// Get redirect decision maker.
    #[must_use]
    pub const fn redirector(&self) -> &Redirector {
        &self.redirector
    }

    /// Get filename allow-list.
    #[must_use]
    pub const fn filter(&self) -> &FilenameFilter {
        &self.filter
    }

    /// Get origin proxy.
    #[must_use]
    pub const fn proxy(&self) -> &CachingProxy {
        &self.proxy
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.started_at)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Server orchestration.
pub struct Server {
    /// Shared application state
    state: Arc<AppState>,
    /// Catalog refresher, restarted by the supervisor on failure
    refresher: Arc<CatalogRefresher>,
    /// Metrics shared by redirector and refresher
    metrics: RedirectMetrics,
    /// Server configuration
    config: ServerConfig,
}

impl Server {
    /// Create new server with configuration.
    ///
    /// Starts with an empty catalog; the first build runs once [`Server::run`]
    /// is called.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if metrics, the feed client or the origin proxy
    /// cannot be set up.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let metrics = RedirectMetrics::new()?;
        let store = Arc::new(CatalogStore::new());

        let client = FeedClient::new(&config.feed_config())?;
        let builder = CatalogBuilder::new(config.release_feeds.clone(), client);
        let refresher = CatalogRefresher::new(
            builder,
            Arc::clone(&store),
            config.refresh_interval(),
            metrics.clone(),
        );

        let state = AppState::new(&config, store, metrics.clone())?;

        tracing::info!(
            "Server initialized with {} release feeds",
            config.release_feeds.len()
        );

        Ok(Self {
            state: Arc::new(state),
            refresher: Arc::new(refresher),
            metrics,
            config,
        })
    }

    /// Run the server until SIGINT, SIGTERM or a listener failure.
    ///
    /// Starts the supervised catalog refresher, the HTTP server and the
    /// metrics server, then waits for a shutdown signal and stops all three.
    /// A listener that fails stops the other two as well.
    ///
    /// # Errors
    ///
    /// Returns the first listener error (for example
    /// `ServerError::HttpBindFailed`), or `ServerError::Shutdown` if the
    /// signal handlers cannot be installed.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting aptweb server");
        tracing::info!("HTTP server binding to: {}", self.config.http_bind);
        tracing::info!("Metrics server binding to: {}", self.config.metrics_bind);

        let shutdown = CancellationToken::new();

        let supervisor = tokio::spawn(supervise_refresher(
            Arc::clone(&self.refresher),
            self.config.restart_delay(),
            shutdown.clone(),
        ));

        let http_state = Arc::clone(&self.state);
        let http_bind = self.config.http_bind;
        let site_dir = self.config.site_dir.clone();
        let http_shutdown = shutdown.clone();
        let http_server = tokio::spawn(async move {
            let result =
                crate::http::start_server(http_bind, http_state, &site_dir, http_shutdown.clone())
                    .await;
            if let Err(e) = &result {
                tracing::error!("HTTP server failed: {e}");
                http_shutdown.cancel();
            }
            result
        });

        let metrics = self.metrics.clone();
        let metrics_bind = self.config.metrics_bind;
        let metrics_shutdown = shutdown.clone();
        let metrics_server = tokio::spawn(async move {
            let result =
                crate::http::start_metrics_server(metrics_bind, metrics, metrics_shutdown.clone())
                    .await;
            if let Err(e) = &result {
                tracing::error!("Metrics server failed: {e}");
                metrics_shutdown.cancel();
            }
            result
        });

        let signal = tokio::select! {
            result = shutdown_signal() => {
                tracing::info!("Shutdown signal received, stopping server");
                result
            }
            () = shutdown.cancelled() => Ok(()),
        };
        shutdown.cancel();

        if let Err(e) = supervisor.await {
            tracing::warn!("refresher task ended abnormally: {e}");
        }

        // The first listener failure decides the exit status
        let mut listener_error = None;
        for (name, task) in [("HTTP server", http_server), ("metrics server", metrics_server)] {
            let result = task.await.unwrap_or_else(|e| {
                Err(ServerError::Shutdown(format!("{name} task ended abnormally: {e}")))
            });
            if let Err(e) = result {
                listener_error.get_or_insert(e);
            }
        }

        tracing::info!("Server stopped after {}s", self.state.uptime_seconds());
        listener_error.map_or(signal, Err)
    }

    /// Get shared application state.
    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

/// Keep the refresher running until `shutdown` is cancelled.
///
/// A failed run is restarted after `restart_delay`. The published catalog is
/// left in place meanwhile.
pub async fn supervise_refresher(
    refresher: Arc<CatalogRefresher>,
    restart_delay: Duration,
    shutdown: CancellationToken,
) {
    loop {
        match refresher.run(shutdown.clone()).await {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    delay_secs = restart_delay.as_secs(),
                    "restarting release catalog refresher"
                );
            }
        }

        tokio::select! {
            biased;
            () = shutdown.cancelled() => return,
            () = tokio::time::sleep(restart_delay) => {}
        }
    }
}

async fn shutdown_signal() -> Result<(), ServerError> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate()).map_err(|e| {
            ServerError::Shutdown(format!("Failed to listen for SIGTERM: {e}"))
        })?;

        tokio::select! {
            result = ctrl_c => result.map_err(|e| {
                ServerError::Shutdown(format!("Failed to listen for shutdown signal: {e}"))
            }),
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.map_err(|e| {
            ServerError::Shutdown(format!("Failed to listen for shutdown signal: {e}"))
        })
    }
}
