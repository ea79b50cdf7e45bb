//! Outbound link filtering
//!
//! Turns the raw anchors of a rendered page into frontier entries: resolved
//! against the page, canonical, http(s), same-site and not yet visited.

use log::debug;

use super::frontier::CrawlFrontier;
use crate::canonical_url::{CanonicalUrl, is_same_site};
use crate::utils::is_http_url;

/// Filter raw links found on `page_url`, keeping DOM order.
#[must_use]
pub fn select_frontier_links(
    seed_url: &str,
    page_url: &CanonicalUrl,
    raw_links: &[String],
    frontier: &CrawlFrontier,
) -> Vec<CanonicalUrl> {
    let base = page_url.to_url();

    let selected: Vec<CanonicalUrl> = raw_links
        .iter()
        .filter_map(|raw| match &base {
            Some(base) => CanonicalUrl::parse_relative(base, raw),
            None => CanonicalUrl::parse(raw),
        })
        .filter(|candidate| is_http_url(candidate.as_str()))
        .filter(|candidate| is_same_site(seed_url, candidate.as_str()))
        .filter(|candidate| !frontier.is_visited(candidate))
        .collect();

    debug!(
        target: "ux_audit::links",
        "Found {} links on {}, {} after filtering",
        raw_links.len(),
        page_url,
        selected.len()
    );

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_filters_external_visited_and_non_http() {
        let seed = "https://example.com";
        let mut frontier = CrawlFrontier::new(seed);
        let page = frontier.pop_next().expect("seed");

        let raw = links(&[
            "/about",
            "https://blog.example.com/x",
            "mailto:team@example.com",
            "https://example.com/#main",
            "pricing/",
            "https://other.org/",
            "http://[bad",
        ]);

        let selected: Vec<String> = select_frontier_links(seed, &page, &raw, &frontier)
            .into_iter()
            .map(CanonicalUrl::into_string)
            .collect();

        assert_eq!(
            selected,
            vec![
                "https://example.com/about".to_string(),
                "https://example.com/pricing".to_string(),
            ]
        );
    }

    #[test]
    fn test_relative_links_resolve_against_current_page() {
        let seed = "https://example.com/";
        let frontier = CrawlFrontier::new(seed);
        let page = CanonicalUrl::parse("https://example.com/docs/intro").expect("valid url");

        let selected = select_frontier_links(seed, &page, &links(&["setup"]), &frontier);
        assert_eq!(selected[0].as_str(), "https://example.com/docs/setup");
    }
}
