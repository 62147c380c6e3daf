//! Immutable name to asset catalog.

use crate::asset::Asset;
use std::collections::HashMap;

/// Mapping from asset name to [`Asset`], rebuilt in full on every refresh.
///
/// A `Catalog` is never mutated after publication; readers hold an
/// `Arc<Catalog>` for the duration of one lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    assets: HashMap<String, Asset>,
    generation: u64,
}

impl Catalog {
    pub(crate) fn from_assets(assets: HashMap<String, Asset>) -> Self {
        Self {
            assets,
            generation: 0,
        }
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Exact lookup by name.
    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    /// Lookup with the tilde fallback.
    ///
    /// Release assets carry `.` where Debian versions use `~`, so a miss is
    /// retried once with the first `~` replaced.
    pub fn resolve(&self, name: &str) -> Option<&Asset> {
        self.get(name).or_else(|| {
            if name.contains('~') {
                self.get(&name.replacen('~', ".", 1))
            } else {
                None
            }
        })
    }

    /// Publication generation; 0 for a catalog that was never published.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the catalog has no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate over all assets in unspecified order.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Whether `name` has an exact entry.
    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> Asset {
        Asset {
            name: name.to_string(),
            download_url: format!("https://cdn/{name}"),
            size: 1,
        }
    }

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::from_assets(
            names
                .iter()
                .map(|name| ((*name).to_string(), asset(name)))
                .collect(),
        )
    }

    #[test]
    fn test_default_is_empty() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.generation(), 0);
        assert!(catalog.resolve("foo_1.0.deb").is_none());
    }

    #[test]
    fn test_exact_match_wins() {
        let catalog = catalog(&["foo~bar.deb", "foo.bar.deb"]);
        assert_eq!(
            catalog.resolve("foo~bar.deb").map(|a| a.name.as_str()),
            Some("foo~bar.deb")
        );
    }

    #[test]
    fn test_tilde_fallback() {
        let catalog = catalog(&["foo.bar.deb"]);
        assert_eq!(
            catalog.resolve("foo~bar.deb").map(|a| a.name.as_str()),
            Some("foo.bar.deb")
        );
    }

    #[test]
    fn test_tilde_fallback_replaces_first_only() {
        let catalog = catalog(&["a.b.c.deb"]);
        assert!(catalog.resolve("a~b~c.deb").is_none());

        let catalog = self::catalog(&["a.b~c.deb"]);
        assert_eq!(
            catalog.resolve("a~b~c.deb").map(|a| a.name.as_str()),
            Some("a.b~c.deb")
        );
    }

    #[test]
    fn test_no_tilde_no_fallback() {
        let catalog = catalog(&["foo.bar.deb"]);
        assert!(catalog.resolve("foo_bar.deb").is_none());
    }
}
