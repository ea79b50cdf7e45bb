//! Visual assessment engine boundary
//!
//! The engine consumes a page snapshot and returns structured dimension
//! scores plus issues. It may be a hosted model, a local heuristic or a
//! human reviewer; the crawl only depends on [`AssessmentEngine`].

pub mod gemini;
pub mod schema;
pub mod validate;

use async_trait::async_trait;

pub use gemini::{GeminiConfig, GeminiEngine};
pub use schema::{Assessment, Dimension, Issue, Severity};
pub use validate::{derive_scores_from_issues, parse_assessment, validate_assessment};

/// Error types for assessment engine calls
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    /// Engine is not configured (e.g. missing API key)
    #[error("Assessment engine not configured: {0}")]
    MissingCredentials(String),

    /// Request never produced a response (DNS, TLS, timeout)
    #[error("Assessment request failed: {0}")]
    Transport(String),

    /// Engine answered with a non-success status
    #[error("Assessment engine returned HTTP {status}: {body}")]
    Engine { status: u16, body: String },

    /// Engine answered, but not with a usable structured result
    #[error("Malformed assessment response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for AssessmentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A visual assessment engine.
///
/// Implementations return either a validated [`Assessment`] or an error;
/// the caller treats every error as "page kept without analysis".
#[async_trait]
pub trait AssessmentEngine: Send + Sync {
    /// Assess one full-page PNG snapshot.
    async fn analyze(&self, snapshot_png: &[u8]) -> Result<Assessment, AssessmentError>;
}
