//! Persistence of audit projects, page records and analyses
//!
//! The crawl only talks to [`AuditStore`]. Two backends are provided:
//! [`MemoryAuditStore`] for tests and dry runs, and [`SqliteAuditStore`]
//! for durable runs.

pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;

use crate::assessment::Assessment;
use crate::canonical_url::CanonicalUrl;
use crate::lifecycle::StatusUpdate;
use crate::snapshot_store::SnapshotRef;

pub use memory::MemoryAuditStore;
pub use models::{
    AnalysisId, AuditProject, PageAnalysis, PageId, PageRecord, PageWithAnalysis, ProjectId,
    ProjectIssue, ProjectResult,
};
pub use sqlite::SqliteAuditStore;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by the persistence layer and the snapshot store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl StorageError {
    pub(crate) fn project_not_found(id: &ProjectId) -> Self {
        Self::NotFound {
            kind: "project",
            id: id.to_string(),
        }
    }

    pub(crate) fn page_not_found(id: &PageId) -> Self {
        Self::NotFound {
            kind: "page",
            id: id.to_string(),
        }
    }
}

/// Store for everything an audit run produces.
///
/// Page records come back in creation order. A page may own several
/// analyses; the most recently saved one is its effective analysis.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Create a queued project for `seed_url`.
    async fn create_project(&self, seed_url: &str) -> StorageResult<AuditProject>;

    async fn get_project(&self, id: &ProjectId) -> StorageResult<AuditProject>;

    /// Create the record of one successfully snapshotted page.
    async fn create_page_record(
        &self,
        project_id: &ProjectId,
        url: &CanonicalUrl,
        snapshot: &SnapshotRef,
    ) -> StorageResult<PageRecord>;

    /// Store a new analysis for a page. Earlier analyses are left intact.
    async fn save_analysis(
        &self,
        page_id: &PageId,
        assessment: Assessment,
    ) -> StorageResult<PageAnalysis>;

    async fn update_project_status(
        &self,
        id: &ProjectId,
        update: &StatusUpdate,
    ) -> StorageResult<()>;

    async fn update_project_result(
        &self,
        id: &ProjectId,
        result: &ProjectResult,
    ) -> StorageResult<()>;

    /// Every page of the project with its effective analysis.
    async fn read_pages_with_analyses(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<PageWithAnalysis>>;

    /// Issues of every effective analysis, tagged with their page URL.
    async fn list_project_issues(&self, project_id: &ProjectId)
    -> StorageResult<Vec<ProjectIssue>>;
}

/// Flatten effective analyses into the project-wide issue list.
pub(crate) fn flatten_issues(pages: Vec<PageWithAnalysis>) -> Vec<ProjectIssue> {
    pages
        .into_iter()
        .filter_map(|entry| {
            let page = entry.page;
            entry.analysis.map(|analysis| (page, analysis))
        })
        .flat_map(|(page, analysis)| {
            analysis.issues.into_iter().map(move |issue| ProjectIssue {
                page_id: page.id.clone(),
                page_url: page.url.clone(),
                issue,
            })
        })
        .collect()
}
