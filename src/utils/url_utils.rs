//! URL and path helpers for snapshot naming.

use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("Invalid scheme prefix regex"));

/// Turn a page URL into a flat, filesystem-safe snapshot base name.
///
/// The scheme is dropped and every character that is not valid in a file
/// name on common platforms is replaced, so
/// `https://example.com/a/b?x=1` becomes `example.com_a_b_x=1`.
#[must_use]
pub fn snapshot_file_stem(url: &str) -> String {
    let without_scheme = SCHEME_PREFIX.replace(url, "");
    let flattened: String = without_scheme
        .chars()
        .map(|c| match c {
            '/' | ':' | '?' | '<' | '>' | '|' | '"' | '\\' | '*' => '_',
            other => other,
        })
        .collect();

    let options = sanitize_filename::Options {
        truncate: true,
        windows: true,
        replacement: "_",
    };
    let sanitized = sanitize_filename::sanitize_with_options(flattened, options);
    if sanitized.is_empty() {
        "page".to_string()
    } else {
        sanitized
    }
}

/// Readable part of a snapshot key is capped so the hash suffix always fits
const MAX_STEM_CHARS: usize = 200;

/// Storage key for a project's snapshot: `<project_id>/<stem>-<hash>.png`
///
/// The stem is lossy (scheme dropped, characters replaced, truncated), so
/// the xxh3 hash of the full URL keeps keys distinct per canonical URL.
#[must_use]
pub fn snapshot_key(project_id: &str, url: &str) -> String {
    let stem: String = snapshot_file_stem(url).chars().take(MAX_STEM_CHARS).collect();
    let hash = xxhash_rust::xxh3::xxh3_64(url.as_bytes());
    format!("{project_id}/{stem}-{hash:016x}.png")
}

/// Check if a URL is an http(s) URL worth auditing
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
