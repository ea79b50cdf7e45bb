//! Chromium-backed renderer

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::extractors::{capture_screenshot, extract_links, wait_for_page_load};
use super::{PageRenderer, RendererFactory};
use crate::browser_setup::launch_browser;
use crate::config::AuditConfig;
use crate::crawl_engine::cleanup::{CleanupResult, cleanup_browser_and_data};
use crate::crawl_engine::page_timeout::with_page_timeout;

struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    /// Profile directory to remove on close, `None` when caller-owned
    owned_data_dir: Option<PathBuf>,
}

/// A single Chromium tab plus the browser process behind it
pub struct ChromiumRenderer {
    session: Option<Session>,
    settle_delay: Duration,
    max_settle_wait_secs: u64,
}

impl ChromiumRenderer {
    /// Launch a browser and open one blank tab.
    pub async fn launch(config: &AuditConfig) -> Result<Self> {
        let (browser, handler, data_dir) = launch_browser(config).await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Don't leak the process when the first tab cannot be opened
                let owned = config.chrome_data_dir().is_none().then_some(data_dir);
                cleanup_browser_and_data(browser, handler, owned).await;
                return Err(anyhow::anyhow!("Failed to open browser tab: {e}"));
            }
        };

        Ok(Self {
            session: Some(Session {
                browser,
                handler,
                page,
                owned_data_dir: config.chrome_data_dir().is_none().then_some(data_dir),
            }),
            settle_delay: config.settle_delay(),
            max_settle_wait_secs: config.max_settle_wait_secs(),
        })
    }

    fn page(&self) -> Result<&Page> {
        self.session
            .as_ref()
            .map(|s| &s.page)
            .context("Renderer already closed")
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;

        with_page_timeout(
            async {
                page.goto(url)
                    .await
                    .map(|_| ())
                    .map_err(|e| anyhow::anyhow!("{e}"))
            },
            timeout,
            "Page navigation",
        )
        .await?;

        wait_for_page_load(page, self.max_settle_wait_secs).await?;
        tokio::time::sleep(self.settle_delay).await;
        debug!(target: "ux_audit::render", "Settled {url}");
        Ok(())
    }

    async fn extract_links(&mut self) -> Result<Vec<String>> {
        extract_links(self.page()?).await
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        capture_screenshot(self.page()?).await
    }

    async fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        if let Err(e) = session.page.close().await {
            debug!(target: "ux_audit::cleanup", "Failed to close tab: {e}");
        }

        match cleanup_browser_and_data(session.browser, session.handler, session.owned_data_dir)
            .await
        {
            CleanupResult::Success => {
                info!(target: "ux_audit::cleanup", "Browser closed");
                Ok(())
            }
            CleanupResult::PartialFailure(errors) => {
                Err(anyhow::anyhow!("Browser cleanup incomplete: {}", errors.join("; ")))
            }
        }
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            warn!(target: "ux_audit::cleanup", "Renderer dropped without close, stopping handler");
            session.handler.abort();
        }
    }
}

/// Launches a fresh [`ChromiumRenderer`] per run
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: AuditConfig,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RendererFactory for ChromiumLauncher {
    async fn acquire(&self) -> Result<Box<dyn PageRenderer>> {
        let renderer = ChromiumRenderer::launch(&self.config).await?;
        Ok(Box::new(renderer))
    }
}
