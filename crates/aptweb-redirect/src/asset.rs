//! Release feed data model.
//!
//! Field names follow the GitHub releases API, which is what the configured
//! feeds serve. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// A downloadable file attached to a release. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name as published (e.g. `syncthing_1.27.0_amd64.deb`)
    pub name: String,

    /// Publicly reachable download URL
    #[serde(rename = "browser_download_url")]
    pub download_url: String,

    /// Declared size in bytes
    #[serde(default)]
    pub size: u64,
}

/// One upstream release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release tag (informational only)
    #[serde(rename = "tag_name", default)]
    pub tag: String,

    /// Assets attached to the release
    #[serde(default)]
    pub assets: Vec<Asset>,
}
