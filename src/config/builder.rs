//! Type-safe builder for `AuditConfig` using the typestate pattern
//!
//! `build()` only exists once a seed URL has been given; every other field
//! has a default and can be set in any state.

use anyhow::{Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::plan::Plan;
use super::types::AuditConfig;
use crate::utils::{
    DEFAULT_PAGE_BUDGET, DEFAULT_SNAPSHOT_DIR, MAX_SETTLE_WAIT_SECS, PAGE_LOAD_TIMEOUT_SECS,
    SETTLE_DELAY_MS, VIEWPORT_HEIGHT, VIEWPORT_WIDTH, is_http_url,
};

// Type state for the builder
pub struct WithSeedUrl;

pub struct AuditConfigBuilder<State = ()> {
    pub(crate) seed_url: Option<String>,
    pub(crate) page_budget: usize,
    pub(crate) storage_dir: PathBuf,
    pub(crate) headless: bool,
    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) settle_delay_ms: u64,
    pub(crate) max_settle_wait_secs: u64,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) chrome_executable: Option<PathBuf>,
    pub(crate) fail_on_empty_crawl: bool,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for AuditConfigBuilder<()> {
    fn default() -> Self {
        Self {
            seed_url: None,
            page_budget: DEFAULT_PAGE_BUDGET,
            storage_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            headless: true,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            page_load_timeout_secs: PAGE_LOAD_TIMEOUT_SECS,
            settle_delay_ms: SETTLE_DELAY_MS,
            max_settle_wait_secs: MAX_SETTLE_WAIT_SECS,
            chrome_data_dir: None,
            chrome_executable: None,
            fail_on_empty_crawl: true,
            _phantom: PhantomData,
        }
    }
}

impl AuditConfig {
    /// Create a builder for configuring an `AuditConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> AuditConfigBuilder<()> {
        AuditConfigBuilder::default()
    }
}

impl AuditConfigBuilder<()> {
    /// Set the seed URL. A missing scheme defaults to `https://`.
    pub fn seed_url(self, url: impl Into<String>) -> AuditConfigBuilder<WithSeedUrl> {
        let url_string = url.into().trim().to_string();
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        AuditConfigBuilder {
            seed_url: Some(normalized_url),
            page_budget: self.page_budget,
            storage_dir: self.storage_dir,
            headless: self.headless,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            page_load_timeout_secs: self.page_load_timeout_secs,
            settle_delay_ms: self.settle_delay_ms,
            max_settle_wait_secs: self.max_settle_wait_secs,
            chrome_data_dir: self.chrome_data_dir,
            chrome_executable: self.chrome_executable,
            fail_on_empty_crawl: self.fail_on_empty_crawl,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when the seed URL is set
impl AuditConfigBuilder<WithSeedUrl> {
    pub fn build(self) -> Result<AuditConfig> {
        let seed_url = self
            .seed_url
            .ok_or_else(|| anyhow!("seed_url is required"))?;
        if !is_http_url(&seed_url) {
            return Err(anyhow!("seed_url must be an absolute http(s) URL: {seed_url}"));
        }
        if self.page_budget == 0 {
            return Err(anyhow!("page_budget must be at least 1"));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(anyhow!(
                "viewport must be non-empty, got {}x{}",
                self.viewport_width,
                self.viewport_height
            ));
        }

        Ok(AuditConfig {
            seed_url,
            page_budget: self.page_budget,
            storage_dir: self.storage_dir,
            headless: self.headless,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            page_load_timeout_secs: self.page_load_timeout_secs,
            settle_delay_ms: self.settle_delay_ms,
            max_settle_wait_secs: self.max_settle_wait_secs,
            chrome_data_dir: self.chrome_data_dir,
            chrome_executable: self.chrome_executable,
            fail_on_empty_crawl: self.fail_on_empty_crawl,
        })
    }
}

// Builder methods available at any state
impl<State> AuditConfigBuilder<State> {
    #[must_use]
    pub fn page_budget(mut self, pages: usize) -> Self {
        self.page_budget = pages;
        self
    }

    /// Take the page budget from a plan's entitlement
    #[must_use]
    pub fn plan(mut self, plan: Plan) -> Self {
        self.page_budget = plan.page_limit();
        self
    }

    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn settle_delay_ms(mut self, millis: u64) -> Self {
        self.settle_delay_ms = millis;
        self
    }

    #[must_use]
    pub fn max_settle_wait_secs(mut self, secs: u64) -> Self {
        self.max_settle_wait_secs = secs;
        self
    }

    /// Use a dedicated Chrome profile directory, so that concurrent runs
    /// do not contend for the same profile lock.
    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }

    /// Launch this Chrome/Chromium binary instead of searching for one
    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    #[must_use]
    pub fn fail_on_empty_crawl(mut self, fail: bool) -> Self {
        self.fail_on_empty_crawl = fail;
        self
    }
}
