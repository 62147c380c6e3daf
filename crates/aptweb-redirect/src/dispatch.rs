//! Per-request redirect decision.

use crate::compat::is_redirect_incompatible;
use crate::filter::requested_name;
use crate::metrics::{FallbackReason, RedirectMetrics};
use crate::store::CatalogStore;
use std::sync::Arc;

/// Target of a redirect decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    /// Requested name after decoding
    pub file: String,
    /// Download URL to send in `Location`
    pub url: String,
    /// Declared asset size in bytes
    pub size: u64,
}

/// Outcome of [`Redirector::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Answer with a temporary redirect
    Redirect(RedirectTarget),
    /// Hand the unchanged request to the origin proxy
    Proxy(FallbackReason),
}

/// Decides between redirecting and proxying using the published catalog.
#[derive(Debug, Clone)]
pub struct Redirector {
    store: Arc<CatalogStore>,
    metrics: RedirectMetrics,
}

impl Redirector {
    /// Create a redirector reading from `store`.
    pub fn new(store: Arc<CatalogStore>, metrics: RedirectMetrics) -> Self {
        Self { store, metrics }
    }

    /// Decide how to serve `path` for a client identifying as `user_agent`.
    ///
    /// The catalog snapshot is loaded once; both the exact and the tilde
    /// lookup run against it.
    pub fn dispatch(&self, path: &str, user_agent: Option<&str>) -> Dispatch {
        let file = requested_name(path);
        let catalog = self.store.load();

        let Some(asset) = catalog.resolve(&file) else {
            self.metrics.record_fallback(FallbackReason::NoMatch);
            return Dispatch::Proxy(FallbackReason::NoMatch);
        };

        let ua = user_agent.unwrap_or_default();
        if is_redirect_incompatible(ua) {
            tracing::info!(file = %file, ua, "serving proxied for buggy APT");
            self.metrics
                .record_fallback(FallbackReason::IncompatibleClient);
            return Dispatch::Proxy(FallbackReason::IncompatibleClient);
        }

        tracing::info!(file = %file, ua, "serving redirect");
        self.metrics.record_redirect(asset.size);

        Dispatch::Redirect(RedirectTarget {
            file: file.into_owned(),
            url: asset.download_url.clone(),
            size: asset.size,
        })
    }

    /// Store this redirector reads from.
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Metrics this redirector records into.
    pub fn metrics(&self) -> &RedirectMetrics {
        &self.metrics
    }
}
