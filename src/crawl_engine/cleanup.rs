//! Browser teardown after a crawl

use chromiumoxide::Browser;
use log::{debug, warn};
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Close the browser, stop its handler task and optionally remove the
/// profile directory.
///
/// Every step is attempted even when an earlier one fails.
pub async fn cleanup_browser_and_data(
    mut browser: Browser,
    handler: JoinHandle<()>,
    chrome_data_dir: Option<PathBuf>,
) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "ux_audit::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "ux_audit::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    // Wait for the process to exit, or chromiumoxide warns on drop
    if let Err(e) = browser.wait().await {
        warn!(target: "ux_audit::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    handler.abort();

    if let Some(dir) = chrome_data_dir {
        debug!(target: "ux_audit::cleanup", "Removing Chrome data directory {}", dir.display());
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!(target: "ux_audit::cleanup", "Failed to clean up Chrome data directory: {e}");
            errors.push(format!("Directory cleanup failed: {e}"));
        }
    }

    if errors.is_empty() {
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}
