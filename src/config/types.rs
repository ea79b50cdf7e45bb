//! Core configuration type for audit runs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration of one audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Absolute http(s) URL the crawl starts from
    pub(crate) seed_url: String,

    /// Maximum number of page records this run may create (≥ 1)
    pub(crate) page_budget: usize,

    /// Directory for transient local snapshots.
    ///
    /// Snapshots are written here before they are handed to the snapshot
    /// store; cleaning them up is left to the caller.
    pub(crate) storage_dir: PathBuf,

    pub(crate) headless: bool,
    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,

    /// Timeout in seconds for `page.goto()`
    ///
    /// Default: 30 seconds
    pub(crate) page_load_timeout_secs: u64,

    /// Fixed pause after the page reports itself loaded
    ///
    /// Default: 2000 ms
    pub(crate) settle_delay_ms: u64,

    /// Upper bound for readyState polling before giving up and snapshotting
    /// whatever rendered
    ///
    /// Default: 10 seconds
    pub(crate) max_settle_wait_secs: u64,

    /// Chrome profile directory; a per-process temp directory when unset
    pub(crate) chrome_data_dir: Option<PathBuf>,

    /// Browser binary; searched for, then downloaded, when unset
    pub(crate) chrome_executable: Option<PathBuf>,

    /// Mark the project failed when no page could be recorded
    pub(crate) fail_on_empty_crawl: bool,
}
