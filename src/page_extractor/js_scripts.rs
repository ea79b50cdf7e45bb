//! JavaScript evaluation scripts
//!
//! This module contains the JavaScript evaluated inside audited pages.

/// Reports whether the document, its body and its images have finished
/// loading
pub const READY_STATE_SCRIPT: &str = r"
    (function() {
        return {
            readyState: document.readyState,
            imagesLoaded: Array.from(document.images).every(img => img.complete),
            bodyExists: document.body !== null
        };
    })()
";

/// Absolute http(s) targets of every anchor, in document order.
///
/// `a.href` is already resolved against the page's base URL by the browser.
/// Duplicates are kept; the crawl frontier deduplicates.
pub const LINKS_SCRIPT: &str = r"
    (() => {
        return Array.from(document.querySelectorAll('a[href]'))
            .map(link => {
                try {
                    const absoluteUrl = new URL(link.href, window.location.href);
                    if (!['http:', 'https:'].includes(absoluteUrl.protocol)) {
                        return null;
                    }
                    return absoluteUrl.href;
                } catch (e) {
                    return null;
                }
            })
            .filter(href => href !== null);
    })()
";
