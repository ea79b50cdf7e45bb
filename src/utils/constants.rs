//! Shared configuration constants for ux_audit
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default page budget when neither a plan nor an explicit limit is given
pub const DEFAULT_PAGE_BUDGET: usize = 10;

/// Default directory for transient local snapshots
pub const DEFAULT_SNAPSHOT_DIR: &str = "screenshots";

/// Viewport used for every audited page
///
/// Matches a common laptop resolution so that above-the-fold content in the
/// snapshot is what most visitors actually see.
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 800;

/// Timeout for `page.goto()` in seconds
pub const PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// Fixed pause after navigation before the page is considered settled
pub const SETTLE_DELAY_MS: u64 = 2000;

/// Upper bound for the readyState / image polling before a snapshot
pub const MAX_SETTLE_WAIT_SECS: u64 = 10;

/// Timeout for a single assessment engine request
pub const ASSESSMENT_TIMEOUT_SECS: u64 = 120;

/// Gemini model used when `GEMINI_MODEL` is not set
pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.5-flash";

/// Public Gemini REST endpoint
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Number of lifecycle steps shown to the user (`Step n/5`)
pub const LIFECYCLE_STEPS: u8 = 5;

/// Chrome user agent string
///
/// Audits should see the same markup a real desktop visitor gets, so the
/// headless marker is not advertised.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
