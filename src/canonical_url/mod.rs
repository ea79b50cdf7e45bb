//! Canonical URL form used for frontier dedup and same-site checks.
//!
//! Canonicalization is intentionally small: the fragment is removed and a
//! single trailing slash is stripped unless the URL is just an origin.
//! Scheme, host, path and query are otherwise preserved exactly as the
//! `url` crate serializes them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use url::Url;

/// A URL in canonical form.
///
/// Two pages are the same audit target iff their `CanonicalUrl`s are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Canonicalize an absolute URL.
    ///
    /// Returns `None` for unparsable input; callers skip such URLs silently.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let parsed = Url::parse(input.trim()).ok()?;
        Some(Self::from_url(parsed))
    }

    /// Resolve `input` against `base` first, then canonicalize.
    #[must_use]
    pub fn parse_relative(base: &Url, input: &str) -> Option<Self> {
        let parsed = base.join(input.trim()).ok()?;
        Some(Self::from_url(parsed))
    }

    /// Wrap a value that was canonicalized before it was stored.
    pub(crate) fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    fn from_url(mut url: Url) -> Self {
        url.set_fragment(None);
        let mut serialized = String::from(url);

        // Only an origin keeps its slash (`https://a.com/`)
        if serialized.ends_with('/') && !is_bare_origin(&serialized) {
            serialized.pop();
        }
        Self(serialized)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed form, for hostname comparison and link resolution.
    #[must_use]
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// `scheme://authority/` with nothing after the slash
fn is_bare_origin(serialized: &str) -> bool {
    match serialized.split_once("://") {
        Some((_, rest)) => rest.find('/') == Some(rest.len() - 1),
        None => false,
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for CanonicalUrl {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strict same-site test: the candidate, resolved against the seed, must
/// have exactly the seed's hostname. Subdomains count as external and no
/// scheme normalization is applied.
#[must_use]
pub fn is_same_site(seed_url: &str, candidate: &str) -> bool {
    let Ok(seed) = Url::parse(seed_url) else {
        return false;
    };
    let Ok(target) = seed.join(candidate) else {
        return false;
    };
    match (seed.host_str(), target.host_str()) {
        (Some(seed_host), Some(target_host)) => seed_host == target_host,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(input: &str) -> String {
        CanonicalUrl::parse(input)
            .map(CanonicalUrl::into_string)
            .unwrap_or_else(|| panic!("{input} should canonicalize"))
    }

    #[test]
    fn test_fragment_is_removed() {
        assert_eq!(
            canon("https://example.com/page#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_single_trailing_slash_is_stripped() {
        assert_eq!(canon("https://example.com/docs/"), "https://example.com/docs");
        assert_eq!(canon("https://example.com/docs//"), "https://example.com/docs/");
    }

    #[test]
    fn test_origin_keeps_its_slash() {
        assert_eq!(canon("https://example.com"), "https://example.com/");
        assert_eq!(canon("https://example.com/"), "https://example.com/");
        assert_eq!(canon("http://localhost:8080/"), "http://localhost:8080/");
    }

    #[test]
    fn test_query_is_preserved() {
        assert_eq!(
            canon("https://example.com/search/?q=rust#top"),
            "https://example.com/search/?q=rust"
        );
    }

    #[test]
    fn test_equivalent_forms_compare_equal() {
        assert_eq!(
            CanonicalUrl::parse("https://example.com/a/#x"),
            CanonicalUrl::parse("https://example.com/a")
        );
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(CanonicalUrl::parse("not a url").is_none());
        assert!(CanonicalUrl::parse("/relative/path").is_none());
        assert!(CanonicalUrl::parse("").is_none());
    }

    #[test]
    fn test_parse_relative_resolves_against_base() {
        let base = Url::parse("https://example.com/docs/intro").expect("valid base");
        assert_eq!(
            CanonicalUrl::parse_relative(&base, "../pricing/").map(CanonicalUrl::into_string),
            Some("https://example.com/pricing".to_string())
        );
    }

    #[test]
    fn test_same_site_requires_exact_hostname() {
        assert!(is_same_site("https://example.com", "https://example.com/about"));
        assert!(is_same_site("https://example.com", "/contact"));
        assert!(is_same_site("https://example.com", "http://example.com/plain"));
        assert!(!is_same_site("https://example.com", "https://blog.example.com/x"));
        assert!(!is_same_site("https://www.example.com", "https://example.com/"));
        assert!(!is_same_site("https://example.com", "https://other.com/"));
        assert!(!is_same_site("not a url", "https://example.com/"));
    }
}
