pub mod assessment;
pub mod browser_setup;
pub mod canonical_url;
pub mod config;
pub mod crawl_engine;
pub mod lifecycle;
pub mod orchestrator;
pub mod page_extractor;
pub mod persistence;
pub mod report;
pub mod scoring;
pub mod snapshot_store;
pub mod utils;

pub use assessment::{Assessment, AssessmentEngine, AssessmentError, GeminiEngine};
pub use browser_setup::{
    download_managed_browser, find_browser_executable, launch_browser, resolve_browser_executable,
};
pub use canonical_url::CanonicalUrl;
pub use config::{AuditConfig, Plan};
pub use crawl_engine::{AuditError, AuditResult, PageOutcome};
pub use lifecycle::{LifecycleController, ProjectStatus};
pub use orchestrator::{AuditRunner, RunSummary};
pub use page_extractor::{ChromiumLauncher, PageRenderer, RendererFactory};
pub use persistence::{AuditStore, MemoryAuditStore, SqliteAuditStore, StorageError};
pub use report::{JsonReportWriter, ReportGenerator};
pub use scoring::{ScoreAggregator, aggregate_scores};
pub use snapshot_store::{FsSnapshotStore, SnapshotRef, SnapshotStore};

/// Audit `config.seed_url()` with the stock collaborators: Chromium,
/// Gemini, a SQLite database at `database` and snapshots under
/// `snapshot_dir`.
pub async fn audit(
    config: AuditConfig,
    database: &std::path::Path,
    snapshot_dir: impl Into<std::path::PathBuf>,
) -> anyhow::Result<RunSummary> {
    let store = std::sync::Arc::new(SqliteAuditStore::open(database).await?);
    let engine = GeminiEngine::new(assessment::GeminiConfig::from_env())?;
    let runner = AuditRunner::new(
        &config,
        store,
        std::sync::Arc::new(FsSnapshotStore::new(snapshot_dir)),
        std::sync::Arc::new(engine),
        std::sync::Arc::new(ChromiumLauncher::new(config.clone())),
    );
    Ok(runner.run_config(&config, None).await?)
}
