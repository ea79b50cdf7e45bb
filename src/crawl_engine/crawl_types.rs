//! Run-level error type and crawl bookkeeping types.

use crate::lifecycle::LifecycleError;
use crate::persistence::StorageError;

/// Errors that end an audit run.
///
/// Per-page faults never become an `AuditError`; they are absorbed by the
/// page processor. Everything here crosses the orchestrator boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The render resource could not be acquired or failed as a whole
    #[error("Browser error: {0}")]
    Browser(String),

    /// Persistence needed by the run itself is unavailable
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Report generation failed: {0}")]
    Report(String),

    /// The run finished without recording a single page
    #[error("No pages could be crawled.")]
    EmptyCrawl,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AuditError {
    /// Wrap a render-layer error, keeping its full context chain
    pub fn browser(err: &anyhow::Error) -> Self {
        Self::Browser(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `AuditError`
pub type AuditResult<T> = Result<T, AuditError>;

/// What one crawl produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// URLs dequeued and handed to the page processor
    pub attempted: usize,
    /// Page records created; never exceeds the budget
    pub recorded: usize,
    /// Page records that also got an analysis
    pub analyzed: usize,
}
