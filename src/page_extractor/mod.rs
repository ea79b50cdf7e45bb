//! Render/navigate primitive
//!
//! The crawl drives a single [`PageRenderer`] for its whole duration: load a
//! URL and wait for it to settle, list its outbound links, rasterize it.
//! [`RendererFactory`] hands out that renderer; the Chromium implementation
//! lives in [`chromium`].

// Sub-modules
pub mod chromium;
pub mod extractors;
pub mod js_scripts;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use chromium::{ChromiumLauncher, ChromiumRenderer};
pub use extractors::{capture_screenshot, extract_links, wait_for_page_load};

/// One browser tab, owned exclusively by the crawl loop
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigate to `url` and wait for it to settle.
    ///
    /// Fails on navigation error or when `timeout` elapses.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Absolute targets of the current page's anchors, in DOM order
    async fn extract_links(&mut self) -> Result<Vec<String>>;

    /// Full-page PNG of the current page
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    /// Release the tab and everything behind it. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Source of renderers; failing to acquire one is fatal for the run
#[async_trait]
pub trait RendererFactory: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn PageRenderer>>;
}
