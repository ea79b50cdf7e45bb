//! Breadth-first crawl loop
//!
//! Pages are processed one at a time with a single renderer. The budget
//! counts recorded pages only, so a page that fails to render or persist
//! does not use it up.

use log::{debug, info, warn};

use super::crawl_types::{AuditResult, CrawlSummary};
use super::frontier::CrawlFrontier;
use super::link_processor::select_frontier_links;
use super::page_processor::PageProcessor;
use crate::lifecycle::LifecycleController;
use crate::page_extractor::PageRenderer;

/// Crawl from `seed_url` until `budget` pages are recorded or the frontier
/// runs dry.
///
/// Only lifecycle persistence failures end the crawl early; every per-page
/// fault is absorbed by `processor`.
pub async fn crawl_site(
    seed_url: &str,
    budget: usize,
    renderer: &mut dyn PageRenderer,
    processor: &PageProcessor,
    lifecycle: &LifecycleController,
) -> AuditResult<CrawlSummary> {
    let mut frontier = CrawlFrontier::new(seed_url);
    let mut summary = CrawlSummary::default();

    info!(target: "ux_audit::crawl", "Crawling {seed_url} with a budget of {budget} pages");

    while summary.recorded < budget {
        let Some(url) = frontier.pop_next() else {
            debug!(target: "ux_audit::crawl", "Frontier exhausted");
            break;
        };
        summary.attempted += 1;

        let outcome = processor.process(renderer, &url).await;

        if outcome.is_recorded() {
            summary.recorded += 1;
            if outcome.is_analyzed() {
                summary.analyzed += 1;
            }
            lifecycle.crawl_progress(summary.recorded, budget).await?;
        }

        if !outcome.rendered() || summary.recorded >= budget {
            continue;
        }

        match renderer.extract_links().await {
            Ok(raw_links) => {
                let discovered = select_frontier_links(seed_url, &url, &raw_links, &frontier);
                frontier.enqueue(discovered);
            }
            Err(e) => {
                warn!(target: "ux_audit::links", "Failed to extract links from {url}: {e:#}");
            }
        }
    }

    info!(
        target: "ux_audit::crawl",
        "Crawl finished: {} attempted, {} recorded, {} analyzed, {} still queued",
        summary.attempted,
        summary.recorded,
        summary.analyzed,
        frontier.pending()
    );

    Ok(summary)
}
