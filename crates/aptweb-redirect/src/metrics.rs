//! Prometheus metrics for the redirect layer.

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

/// Why a request went to the origin proxy instead of being redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No catalog entry for the requested name
    NoMatch,
    /// Catalog hit, but the client cannot follow the redirect
    IncompatibleClient,
}

impl FallbackReason {
    /// Value of the `source` label for this outcome.
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::NoMatch => "proxy",
            Self::IncompatibleClient => "compat_proxy",
        }
    }
}

/// Metrics registry and handles for redirect decisions and catalog refreshes.
#[derive(Clone)]
pub struct RedirectMetrics {
    registry: Registry,
    redirects: IntCounter,
    redirect_bytes: IntCounter,
    assets_loaded: IntGauge,
    file_requests: IntCounterVec,
    refreshes: IntCounterVec,
}

impl RedirectMetrics {
    /// Create and register all metrics in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns `prometheus::Error` if a metric cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let redirects = IntCounter::new(
            "aptweb_redirects_total",
            "Total number of requests answered with a release asset redirect",
        )?;
        registry.register(Box::new(redirects.clone()))?;

        let redirect_bytes = IntCounter::new(
            "aptweb_redirect_bytes_total",
            "Declared size of all redirected assets in bytes",
        )?;
        registry.register(Box::new(redirect_bytes.clone()))?;

        let assets_loaded = IntGauge::new(
            "aptweb_redirect_assets_loaded",
            "Number of assets in the published catalog",
        )?;
        registry.register(Box::new(assets_loaded.clone()))?;

        let file_requests = IntCounterVec::new(
            Opts::new(
                "aptweb_file_requests_total",
                "Package repository requests by serving path",
            ),
            &["source"],
        )?;
        registry.register(Box::new(file_requests.clone()))?;

        let refreshes = IntCounterVec::new(
            Opts::new(
                "aptweb_catalog_refreshes_total",
                "Catalog refresh attempts by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(refreshes.clone()))?;

        Ok(Self {
            registry,
            redirects,
            redirect_bytes,
            assets_loaded,
            file_requests,
            refreshes,
        })
    }

    /// Record a redirect for an asset of the given declared size.
    pub fn record_redirect(&self, size: u64) {
        self.redirects.inc();
        self.redirect_bytes.inc_by(size);
        self.file_requests.with_label_values(&["redirect"]).inc();
    }

    /// Record a proxy fallback.
    pub fn record_fallback(&self, reason: FallbackReason) {
        self.file_requests
            .with_label_values(&[reason.as_label()])
            .inc();
    }

    /// Record a refresh attempt and, on success, the published asset count.
    #[allow(clippy::cast_possible_wrap)]
    pub fn record_refresh(&self, assets: Option<usize>) {
        match assets {
            Some(count) => {
                self.assets_loaded.set(count as i64);
                self.refreshes.with_label_values(&["ok"]).inc();
            }
            None => self.refreshes.with_label_values(&["error"]).inc(),
        }
    }

    /// Registry for serving.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format.
    pub fn gather(&self) -> String {
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Redirects issued so far.
    pub fn redirects(&self) -> u64 {
        self.redirects.get()
    }

    /// Requests counted under a `source` label.
    pub fn file_requests(&self, source: &str) -> u64 {
        self.file_requests.with_label_values(&[source]).get()
    }
}

impl std::fmt::Debug for RedirectMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectMetrics")
            .field("redirects", &self.redirects.get())
            .field("redirect_bytes", &self.redirect_bytes.get())
            .field("assets_loaded", &self.assets_loaded.get())
            .finish_non_exhaustive()
    }
}
