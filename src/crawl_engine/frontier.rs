//! Run-scoped crawl frontier and visited set.
//!
//! Created per crawl call and dropped with it, so concurrent runs never
//! share state.

use log::warn;
use std::collections::{HashSet, VecDeque};

use crate::canonical_url::CanonicalUrl;

/// FIFO queue of discovered URLs plus the set of URLs already dequeued
#[derive(Debug, Default)]
pub struct CrawlFrontier {
    queue: VecDeque<CanonicalUrl>,
    visited: HashSet<CanonicalUrl>,
}

impl CrawlFrontier {
    /// Frontier holding only the seed. An unparsable seed gives an empty
    /// frontier.
    #[must_use]
    pub fn new(seed_url: &str) -> Self {
        let mut frontier = Self::default();
        match CanonicalUrl::parse(seed_url) {
            Some(seed) => frontier.queue.push_back(seed),
            None => warn!(target: "ux_audit::crawl", "Seed URL is not a valid URL: {seed_url}"),
        }
        frontier
    }

    /// Dequeue the oldest URL not visited yet and mark it visited.
    ///
    /// Already-visited entries are discarded on the way.
    pub fn pop_next(&mut self) -> Option<CanonicalUrl> {
        while let Some(url) = self.queue.pop_front() {
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Append to the back, preserving the given order.
    pub fn enqueue(&mut self, urls: impl IntoIterator<Item = CanonicalUrl>) {
        self.queue.extend(urls);
    }

    #[must_use]
    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> CanonicalUrl {
        CanonicalUrl::parse(s).unwrap_or_else(|| panic!("{s} should canonicalize"))
    }

    #[test]
    fn test_fifo_order_and_dedup() {
        let mut frontier = CrawlFrontier::new("https://example.com/#top");
        assert_eq!(frontier.pop_next(), Some(url("https://example.com/")));

        frontier.enqueue([
            url("https://example.com/a"),
            url("https://example.com/b"),
            url("https://example.com/a"),
            url("https://example.com/"),
        ]);

        assert_eq!(frontier.pop_next(), Some(url("https://example.com/a")));
        assert_eq!(frontier.pop_next(), Some(url("https://example.com/b")));
        assert_eq!(frontier.pop_next(), None);
        assert_eq!(frontier.visited_count(), 3);
        assert!(frontier.is_visited(&url("https://example.com/b")));
    }

    #[test]
    fn test_invalid_seed_gives_empty_frontier() {
        let mut frontier = CrawlFrontier::new("not a url");
        assert_eq!(frontier.pending(), 0);
        assert_eq!(frontier.pop_next(), None);
    }
}
