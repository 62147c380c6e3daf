//! Catalog construction from release feeds.
//!
//! Assets from every feed are merged into one map. A name seen twice in the
//! same build, whether within one feed or across feeds, is dropped and stays
//! dropped for the rest of the build: an ambiguous name is proxied rather than
//! redirected to a guess.

use crate::asset::{Asset, Release};
use crate::catalog::Catalog;
use crate::error::Result;
use crate::feed::FeedClient;
use reqwest::header::HeaderValue;
use std::collections::{HashMap, HashSet};

/// Accumulates assets with collision exclusion.
#[derive(Debug, Default)]
pub struct CatalogMerger {
    assets: HashMap<String, Asset>,
    duplicates: HashSet<String>,
}

impl CatalogMerger {
    /// Create an empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single asset.
    ///
    /// Assets whose download URL cannot be sent as a `Location` header are
    /// left out; their names stay proxied.
    pub fn add_asset(&mut self, asset: Asset) {
        if HeaderValue::from_str(&asset.download_url).is_err() {
            tracing::debug!(key = %asset.name, "skipping asset with unusable download URL");
            return;
        }

        if self.duplicates.contains(&asset.name) {
            return;
        }

        if self.assets.remove(&asset.name).is_some() {
            tracing::debug!(key = %asset.name, "skipping non-unique asset");
            self.duplicates.insert(asset.name);
            return;
        }

        self.assets.insert(asset.name.clone(), asset);
    }

    /// Add every asset of every release from one feed.
    pub fn add_releases(&mut self, releases: impl IntoIterator<Item = Release>) {
        for release in releases {
            for asset in release.assets {
                self.add_asset(asset);
            }
        }
    }

    /// Names excluded so far because they collided.
    pub fn duplicates(&self) -> &HashSet<String> {
        &self.duplicates
    }

    /// Finish the build.
    pub fn finish(self) -> Catalog {
        Catalog::from_assets(self.assets)
    }
}

/// Builds a fresh [`Catalog`] from an ordered list of release feeds.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    feeds: Vec<String>,
    client: FeedClient,
}

impl CatalogBuilder {
    /// Create a builder for the given feeds.
    pub fn new(feeds: Vec<String>, client: FeedClient) -> Self {
        Self { feeds, client }
    }

    /// Feed URLs in fetch order.
    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    /// Fetch every feed in order and merge the results.
    ///
    /// Feeds are fetched sequentially. The first failure aborts the build.
    ///
    /// # Errors
    ///
    /// Returns the first [`FeedError`](crate::FeedError) encountered.
    pub async fn build(&self) -> Result<Catalog> {
        let mut merger = CatalogMerger::new();

        for url in &self.feeds {
            let releases = self.client.fetch_releases(url).await?;
            tracing::debug!(feed = %url, releases = releases.len(), "fetched release feed");
            merger.add_releases(releases);
        }

        if !merger.duplicates().is_empty() {
            tracing::info!(
                excluded = merger.duplicates().len(),
                "excluded non-unique asset names from catalog"
            );
        }

        Ok(merger.finish())
    }
}
