//! Page-level extraction helpers on top of a chromiumoxide `Page`

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use std::time::{Duration, Instant};

use super::js_scripts::{LINKS_SCRIPT, READY_STATE_SCRIPT};

/// Wait for page to be fully loaded before taking a snapshot
///
/// Polls the page until `document.readyState === 'complete'` and a body
/// exists, with a short extra wait while images are still loading.
/// `page.goto()` only waits for the HTTP response, so without this JS-heavy
/// sites snapshot blank.
///
/// Gives up silently after `max_wait_secs` and lets the caller snapshot
/// whatever has rendered.
pub async fn wait_for_page_load(page: &Page, max_wait_secs: u64) -> Result<()> {
    let start = Instant::now();
    let max_wait = Duration::from_secs(max_wait_secs);
    let poll_interval = Duration::from_millis(100);

    log::debug!(target: "ux_audit::render", "Waiting for page to be fully loaded (max {max_wait_secs}s)");

    loop {
        if start.elapsed() >= max_wait {
            log::warn!(target: "ux_audit::render", "Timeout waiting for page load after {max_wait_secs}s, proceeding anyway");
            break;
        }

        match page.evaluate(READY_STATE_SCRIPT).await {
            Ok(result) => {
                if let Ok(value) = result.into_value::<serde_json::Value>() {
                    let ready_state = value.get("readyState").and_then(|v| v.as_str());
                    let images_loaded = value
                        .get("imagesLoaded")
                        .and_then(serde_json::Value::as_bool)
                        .unwrap_or(false);
                    let body_exists = value
                        .get("bodyExists")
                        .and_then(serde_json::Value::as_bool)
                        .unwrap_or(false);

                    if ready_state == Some("complete") && body_exists {
                        log::debug!(
                            target: "ux_audit::render",
                            "Page ready after {:.2}s (images loaded: {images_loaded})",
                            start.elapsed().as_secs_f64()
                        );
                        if !images_loaded {
                            tokio::time::sleep(Duration::from_millis(500)).await;
                        }
                        break;
                    }
                }
            }
            Err(e) => {
                log::debug!(target: "ux_audit::render", "Failed to check readyState: {e}, retrying");
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Outbound anchor targets of the rendered page, in DOM order
pub async fn extract_links(page: &Page) -> Result<Vec<String>> {
    let js_result = page
        .evaluate(LINKS_SCRIPT)
        .await
        .context("Failed to execute links extraction script")?;

    let links: Vec<String> = js_result
        .into_value()
        .map_err(|e| anyhow::anyhow!("Failed to get links value: {e}"))?;

    Ok(links)
}

/// Full-page PNG, including content below the fold
pub async fn capture_screenshot(page: &Page) -> Result<Vec<u8>> {
    let params = CaptureScreenshotParams {
        format: Some(CaptureScreenshotFormat::Png),
        capture_beyond_viewport: Some(true),
        ..Default::default()
    };

    page.screenshot(params)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to capture screenshot: {e}"))
}
