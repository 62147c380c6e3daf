//! Filename allow-list for the package repository path.
//!
//! Only the final path segment is considered. Patterns are shell globs as
//! understood by the `glob` crate: `*` never crosses `/`, matching is
//! case-sensitive, and no extension normalisation happens.

use crate::error::FilterError;
use glob::{MatchOptions, Pattern};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

/// Repository metadata names and package files served by default.
pub const DEFAULT_ALLOWED_NAMES: &[&str] = &[
    "*.deb",
    "InRelease",
    "InRelease.gz",
    "Release",
    "Release.gz",
    "Release.gpg",
    "Release.gpg.gz",
    "Packages",
    "Packages.gz",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Last element of a slash-separated path.
///
/// Trailing slashes are ignored. An empty path yields `.` and a path made
/// only of slashes yields `/`.
pub fn final_segment(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }

    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Percent-decode a path segment, falling back to the input when the result
/// is not valid UTF-8.
pub fn decode_segment(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(segment))
}

/// Decoded final segment of a request path.
pub fn requested_name(path: &str) -> Cow<'_, str> {
    decode_segment(final_segment(path))
}

/// Compiled allow-list.
#[derive(Debug, Clone)]
pub struct FilenameFilter {
    patterns: Vec<Pattern>,
}

impl FilenameFilter {
    /// Compile an allow-list.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidPattern` for the first pattern that is not
    /// a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|source| FilterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Whether a bare file name matches any pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }

    /// Whether the final segment of a request path is allowed.
    ///
    /// The segment is split off before decoding, so an encoded slash stays
    /// inside the name: `/dists/a%2Fb.deb` is checked as `a/b.deb` and
    /// rejected, since `*` never matches `/`.
    pub fn accepts_path(&self, path: &str) -> bool {
        self.matches(&requested_name(path))
    }

    /// Patterns in configured order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }
}

impl Default for FilenameFilter {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_ALLOWED_NAMES
                .iter()
                .filter_map(|pattern| Pattern::new(pattern).ok())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_final_segment() {
        assert_eq!(final_segment("/dists/stable/InRelease"), "InRelease");
        assert_eq!(final_segment("/dists/foo_1.0.deb"), "foo_1.0.deb");
        assert_eq!(final_segment("/dists/stable/"), "stable");
        assert_eq!(final_segment("Release"), "Release");
        assert_eq!(final_segment(""), ".");
        assert_eq!(final_segment("///"), "/");
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("foo%7E1.deb"), "foo~1.deb");
        assert_eq!(decode_segment("plain.deb"), "plain.deb");
        // Invalid UTF-8 after decoding keeps the original
        assert_eq!(decode_segment("bad%FF.deb"), "bad%FF.deb");
        // Malformed escapes are left alone
        assert_eq!(decode_segment("odd%zz.deb"), "odd%zz.deb");
    }

    #[test]
    fn test_default_allow_list() {
        let filter = FilenameFilter::default();

        for path in [
            "/dists/foo_1.0.deb",
            "/dists/stable/InRelease",
            "/dists/stable/Release",
            "/dists/stable/Release.gpg",
            "/dists/stable/main/binary-amd64/Packages",
            "/dists/stable/main/binary-amd64/Packages.gz",
            "/dists/syncthing_1.27.0%7Erc.1_amd64.deb",
        ] {
            assert!(filter.accepts_path(path), "path: {path}");
        }

        for path in [
            "/dists/not-allowed.txt",
            "/dists/foo.DEB",
            "/dists/release",
            "/dists/Packages.xz",
            "/dists/",
            "",
        ] {
            assert!(!filter.accepts_path(path), "path: {path}");
        }
    }

    #[test]
    fn test_encoded_slash_stays_in_name() {
        let filter = FilenameFilter::default();

        assert_eq!(requested_name("/dists/a%2Fb.deb"), "a/b.deb");
        assert!(!filter.accepts_path("/dists/a%2Fb.deb"));
        assert!(filter.accepts_path("/dists/a/b.deb"));
    }

    #[test]
    fn test_default_patterns_compile() {
        assert_eq!(
            FilenameFilter::default().patterns().count(),
            DEFAULT_ALLOWED_NAMES.len()
        );
    }

    #[test]
    fn test_custom_patterns() {
        let filter = FilenameFilter::new(["Sources.gz", "*.dsc"]).unwrap();
        assert!(filter.matches("hello_1.0.dsc"));
        assert!(filter.matches("Sources.gz"));
        assert!(!filter.matches("hello_1.0.deb"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = FilenameFilter::new(["*.deb", "[unclosed"]);
        assert!(matches!(
            result,
            Err(FilterError::InvalidPattern { ref pattern, .. }) if pattern == "[unclosed"
        ));
    }

    proptest! {
        #[test]
        fn prop_non_matching_extension_rejected(stem in "[a-z0-9_.~-]{1,20}", ext in "(txt|html|xz|rpm)") {
            let filter = FilenameFilter::default();
            let path = format!("/dists/{stem}.{ext}");
            prop_assert!(!filter.accepts_path(&path));
        }

        #[test]
        fn prop_any_deb_accepted(stem in "[a-zA-Z0-9_.+~-]{1,40}") {
            let filter = FilenameFilter::default();
            let path = format!("/dists/pool/{stem}.deb");
            prop_assert!(filter.accepts_path(&path));
        }
    }
}
