//! Locating, downloading and launching Chromium.

use anyhow::{Context, Result, bail};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::env::consts::EXE_SUFFIX;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::config::AuditConfig;
use crate::utils::constants::CHROME_USER_AGENT;

/// Browser binary names looked up on `PATH`, in preference order
const BROWSER_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Install locations that are usually not on `PATH`
#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];
#[cfg(not(target_os = "macos"))]
const INSTALL_PATHS: &[&str] = &["/opt/google/chrome/chrome", "/snap/bin/chromium"];

/// Flags for repeatable, unattended full-page snapshots
const SNAPSHOT_ARGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-infobars",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Pick the browser binary for `config`.
///
/// An explicitly configured executable must exist. Otherwise a local
/// install is used, and a managed Chromium is downloaded as a last resort.
pub async fn resolve_browser_executable(config: &AuditConfig) -> Result<PathBuf> {
    if let Some(path) = config.chrome_executable() {
        if !path.is_file() {
            bail!("Configured browser executable not found: {}", path.display());
        }
        info!("Using configured browser: {}", path.display());
        return Ok(path.clone());
    }

    let search_path = std::env::var_os("PATH").unwrap_or_default();
    match find_browser_executable(&search_path) {
        Some(path) => Ok(path),
        None => {
            warn!("No local Chrome/Chromium found, downloading a managed build");
            download_managed_browser().await
        }
    }
}

/// Look for a browser in the directories of `search_path` (a `PATH`-style
/// list), then in the platform's usual install locations.
#[must_use]
pub fn find_browser_executable(search_path: &OsStr) -> Option<PathBuf> {
    let on_path = std::env::split_paths(search_path).flat_map(|dir| {
        BROWSER_NAMES
            .iter()
            .map(move |name| dir.join(format!("{name}{EXE_SUFFIX}")))
    });

    let found = on_path
        .chain(INSTALL_PATHS.iter().map(PathBuf::from))
        .find(|candidate| candidate.is_file());
    if let Some(path) = &found {
        info!("Found browser at: {}", path.display());
    }
    found
}

/// Downloads Chromium into the user cache directory if no local browser
/// was found. Returns the path to the downloaded executable.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .map(|dir| dir.join("ux-audit"))
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir().join("ux_audit_chrome_cache");
            warn!(
                "Could not determine user cache directory, using temp directory fallback: {}",
                fallback.display()
            );
            fallback
        })
        .join("chromium");

    tokio::fs::create_dir_all(&cache_dir)
        .await
        .context("Failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Find or download Chrome/Chromium and launch it with the audit viewport.
///
/// Returns the browser, the task driving its CDP handler, and the profile
/// directory in use (removed again on close).
///
/// # Profile Isolation
/// When the config names a `chrome_data_dir`, that profile is used; otherwise
/// a per-process directory under the temp dir.
pub async fn launch_browser(config: &AuditConfig) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let chrome_path = resolve_browser_executable(config).await?;

    let user_data_dir = config.chrome_data_dir().cloned().unwrap_or_else(|| {
        std::env::temp_dir().join(format!("ux_audit_chrome_{}", std::process::id()))
    });

    tokio::fs::create_dir_all(&user_data_dir)
        .await
        .context("Failed to create user data directory")?;

    let (width, height) = config.viewport();
    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(config.page_load_timeout_secs()))
        .window_size(width, height)
        .viewport(Viewport {
            width,
            height,
            ..Viewport::default()
        })
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(chrome_path);

    if config.headless() {
        config_builder = config_builder.headless_mode(HeadlessMode::default());
    } else {
        config_builder = config_builder.with_head();
    }

    config_builder = config_builder
        .arg(format!("--user-agent={CHROME_USER_AGENT}"))
        .args(SNAPSHOT_ARGS.iter().copied());

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser with config: {:?}", browser_config);
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            match event {
                Ok(()) => {}
                Err(e) if is_undecodable_event(&e.to_string()) => {
                    trace!("Ignoring undecodable CDP event: {e}");
                }
                Err(e) => error!("Browser handler error: {e:?}"),
            }
        }
        info!("Browser handler task completed");
    });

    Ok((browser, handler_task, user_data_dir))
}

/// Chrome emits CDP messages chromiumoxide has no type for
fn is_undecodable_event(message: &str) -> bool {
    message.contains("data did not match any variant of untagged enum Message")
        || message.contains("Failed to deserialize WS response")
}
