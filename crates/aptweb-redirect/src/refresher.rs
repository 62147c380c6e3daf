//! Recurring catalog rebuild.
//!
//! The first build starts immediately. The next one is scheduled only after
//! the previous build finished, so a slow feed stretches the cycle instead of
//! stacking builds. A failed build ends the task; restarting it is the
//! caller's business.

use crate::builder::CatalogBuilder;
use crate::error::Result;
use crate::metrics::RedirectMetrics;
use crate::store::CatalogStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Rebuilds and publishes the catalog on a fixed interval.
#[derive(Debug)]
pub struct CatalogRefresher {
    builder: CatalogBuilder,
    store: Arc<CatalogStore>,
    interval: Duration,
    metrics: RedirectMetrics,
}

impl CatalogRefresher {
    /// Create a refresher publishing into `store`.
    pub fn new(
        builder: CatalogBuilder,
        store: Arc<CatalogStore>,
        interval: Duration,
        metrics: RedirectMetrics,
    ) -> Self {
        Self {
            builder,
            store,
            interval,
            metrics,
        }
    }

    /// Refresh interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` is cancelled or a build fails.
    ///
    /// # Errors
    ///
    /// Returns the [`FeedError`](crate::FeedError) of the first failed build.
    /// The published snapshot is left as it was.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        tracing::info!(
            feeds = self.builder.feeds().len(),
            interval_secs = self.interval.as_secs(),
            "starting release catalog refresher"
        );

        let result = self.refresh_loop(&shutdown).await;

        match &result {
            Ok(()) => tracing::info!("stopping release catalog refresher"),
            Err(e) => tracing::error!(error = %e, "release catalog refresh failed"),
        }

        result
    }

    async fn refresh_loop(&self, shutdown: &CancellationToken) -> Result<()> {
        let mut delay = Duration::ZERO;

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return Ok(()),
                () = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                biased;
                () = shutdown.cancelled() => return Ok(()),
                refreshed = self.refresh_once() => { refreshed?; }
            }

            delay = self.interval;
        }
    }

    /// Run a single build and publish it.
    ///
    /// # Errors
    ///
    /// Returns the build error; nothing is published in that case.
    pub async fn refresh_once(&self) -> Result<u64> {
        match self.builder.build().await {
            Ok(catalog) => {
                let count = catalog.len();
                let generation = self.store.publish(catalog);
                self.metrics.record_refresh(Some(count));
                tracing::info!(assets = count, generation, "published release catalog");
                Ok(generation)
            }
            Err(e) => {
                self.metrics.record_refresh(None);
                Err(e)
            }
        }
    }
}
