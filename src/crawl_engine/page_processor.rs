//! Single page processing logic
//!
//! Handles the complete lifecycle of one dequeued URL:
//! - Navigation and settling
//! - Snapshot capture to transient local storage
//! - Snapshot upload and page record creation
//! - Assessment and analysis persistence
//!
//! A failing step aborts the remaining steps for this page only. Nothing here
//! returns an error to the crawl loop; faults are logged and reported through
//! [`PageOutcome`].

use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::assessment::AssessmentEngine;
use crate::canonical_url::CanonicalUrl;
use crate::page_extractor::PageRenderer;
use crate::persistence::{AuditStore, PageId, ProjectId};
use crate::snapshot_store::SnapshotStore;
use crate::utils::snapshot_key;

/// Step of the page pipeline a fault happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStage {
    Navigate,
    Capture,
    Upload,
    Record,
    Analyze,
    SaveAnalysis,
}

impl fmt::Display for PageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Navigate => "navigate",
            Self::Capture => "capture",
            Self::Upload => "upload",
            Self::Record => "record",
            Self::Analyze => "analyze",
            Self::SaveAnalysis => "save analysis",
        };
        f.write_str(name)
    }
}

/// What happened to one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A page record exists. `analyzed` is false when assessment or its
    /// persistence failed.
    Recorded { page_id: PageId, analyzed: bool },

    /// The page rendered but no record could be created
    Dropped { stage: PageStage, reason: String },

    /// The page never produced a snapshot
    Skipped { stage: PageStage, reason: String },
}

impl PageOutcome {
    /// Whether the renderer still shows this page, so its links can be read
    #[must_use]
    pub fn rendered(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }

    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }

    #[must_use]
    pub fn is_analyzed(&self) -> bool {
        matches!(self, Self::Recorded { analyzed: true, .. })
    }
}

/// Run-scoped collaborators needed to process pages of one project
pub struct PageProcessor {
    project_id: ProjectId,
    store: Arc<dyn AuditStore>,
    snapshots: Arc<dyn SnapshotStore>,
    engine: Arc<dyn AssessmentEngine>,
    storage_dir: PathBuf,
    page_load_timeout: Duration,
}

impl PageProcessor {
    pub fn new(
        project_id: ProjectId,
        store: Arc<dyn AuditStore>,
        snapshots: Arc<dyn SnapshotStore>,
        engine: Arc<dyn AssessmentEngine>,
        storage_dir: impl Into<PathBuf>,
        page_load_timeout: Duration,
    ) -> Self {
        Self {
            project_id,
            store,
            snapshots,
            engine,
            storage_dir: storage_dir.into(),
            page_load_timeout,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Process one URL with the run's renderer.
    pub async fn process(&self, renderer: &mut dyn PageRenderer, url: &CanonicalUrl) -> PageOutcome {
        debug!(target: "ux_audit::crawl", "Processing {url}");

        if let Err(e) = renderer.goto(url.as_str(), self.page_load_timeout).await {
            return skipped(url, PageStage::Navigate, format!("{e:#}"));
        }

        let bytes = match renderer.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => return skipped(url, PageStage::Capture, format!("{e:#}")),
        };

        let key = snapshot_key(self.project_id.as_str(), url.as_str());
        if let Err(e) = write_transient(&self.storage_dir, &key, &bytes).await {
            return skipped(url, PageStage::Capture, e.to_string());
        }

        let snapshot = match self.snapshots.put(&bytes, &key).await {
            Ok(snapshot) => snapshot,
            Err(e) => return dropped(url, PageStage::Upload, e.to_string()),
        };

        let page = match self
            .store
            .create_page_record(&self.project_id, url, &snapshot)
            .await
        {
            Ok(page) => page,
            Err(e) => return dropped(url, PageStage::Record, e.to_string()),
        };
        info!(target: "ux_audit::crawl", "Recorded {url} as page {}", page.id);

        let analyzed = match self.engine.analyze(&bytes).await {
            Ok(assessment) => match self.store.save_analysis(&page.id, assessment).await {
                Ok(analysis) => {
                    debug!(
                        target: "ux_audit::crawl",
                        "Saved analysis {} for {url} (overall {:?})",
                        analysis.id,
                        analysis.overall_score
                    );
                    true
                }
                Err(e) => {
                    warn_stage(url, PageStage::SaveAnalysis, &e.to_string());
                    false
                }
            },
            Err(e) => {
                warn_stage(url, PageStage::Analyze, &e.to_string());
                false
            }
        };

        PageOutcome::Recorded {
            page_id: page.id,
            analyzed,
        }
    }
}

async fn write_transient(storage_dir: &Path, key: &str, bytes: &[u8]) -> std::io::Result<()> {
    let path = storage_dir.join(key);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, bytes).await
}

fn warn_stage(url: &CanonicalUrl, stage: PageStage, reason: &str) {
    warn!(target: "ux_audit::crawl", "Page {url} failed at {stage}: {reason}");
}

fn skipped(url: &CanonicalUrl, stage: PageStage, reason: String) -> PageOutcome {
    warn_stage(url, stage, &reason);
    PageOutcome::Skipped { stage, reason }
}

fn dropped(url: &CanonicalUrl, stage: PageStage, reason: String) -> PageOutcome {
    warn_stage(url, stage, &reason);
    PageOutcome::Dropped { stage, reason }
}
