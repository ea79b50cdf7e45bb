//! Audit run orchestration
//!
//! Drives one audit from seed URL to scored project:
//! - Project creation (or reuse of a caller-supplied project)
//! - Lifecycle transitions around the crawl
//! - Render resource acquisition and release on every exit path
//! - Score aggregation and the optional report stage
//!
//! Errors from any phase are caught once here, recorded on the project as a
//! terminal status, and returned to the caller.

use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::assessment::AssessmentEngine;
use crate::config::AuditConfig;
use crate::crawl_engine::crawler::crawl_site;
use crate::crawl_engine::page_processor::PageProcessor;
use crate::crawl_engine::{AuditError, AuditResult, CrawlSummary};
use crate::lifecycle::{LifecycleController, ProjectStatus};
use crate::page_extractor::RendererFactory;
use crate::persistence::{AuditProject, AuditStore, ProjectId};
use crate::report::ReportGenerator;
use crate::scoring::ScoreAggregator;
use crate::snapshot_store::SnapshotStore;
use crate::utils::is_http_url;

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub project_id: ProjectId,
    /// Page records created, not URLs attempted
    pub pages_scanned: usize,
}

/// Collaborators and settings shared by every run
pub struct AuditRunner {
    store: Arc<dyn AuditStore>,
    snapshots: Arc<dyn SnapshotStore>,
    engine: Arc<dyn AssessmentEngine>,
    renderers: Arc<dyn RendererFactory>,
    reports: Option<Arc<dyn ReportGenerator>>,
    storage_dir: PathBuf,
    page_load_timeout: Duration,
    fail_on_empty_crawl: bool,
}

impl AuditRunner {
    pub fn new(
        config: &AuditConfig,
        store: Arc<dyn AuditStore>,
        snapshots: Arc<dyn SnapshotStore>,
        engine: Arc<dyn AssessmentEngine>,
        renderers: Arc<dyn RendererFactory>,
    ) -> Self {
        Self {
            store,
            snapshots,
            engine,
            renderers,
            reports: None,
            storage_dir: config.storage_dir().to_path_buf(),
            page_load_timeout: config.page_load_timeout(),
            fail_on_empty_crawl: config.fail_on_empty_crawl(),
        }
    }

    /// Add a report stage after scoring
    #[must_use]
    pub fn with_report_generator(mut self, reports: Arc<dyn ReportGenerator>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Run the seed URL and budget carried by `config`.
    pub async fn run_config(
        &self,
        config: &AuditConfig,
        project_id: Option<ProjectId>,
    ) -> AuditResult<RunSummary> {
        self.run(config.seed_url(), project_id, config.page_budget())
            .await
    }

    /// Audit `seed_url`, recording at most `page_budget` pages.
    ///
    /// A new project is created unless `project_id` names a queued one.
    /// On error the project has already been marked `failed` (crawl phase)
    /// or `error` (after crawling) when the error is returned.
    pub async fn run(
        &self,
        seed_url: &str,
        project_id: Option<ProjectId>,
        page_budget: usize,
    ) -> AuditResult<RunSummary> {
        if page_budget == 0 {
            return Err(AuditError::InvalidInput(
                "page budget must be at least 1".to_string(),
            ));
        }
        if !is_http_url(seed_url) {
            return Err(AuditError::InvalidInput(format!(
                "seed URL must be an absolute http(s) URL: {seed_url}"
            )));
        }

        let project = self.resolve_project(seed_url, project_id).await?;
        let lifecycle = LifecycleController::new(Arc::clone(&self.store), &project);
        info!(
            target: "ux_audit::run",
            "Starting audit of {seed_url} as project {} (budget {page_budget})",
            project.id
        );

        let crawl = match self.crawl_phase(&lifecycle, seed_url, page_budget).await {
            Ok(crawl) => crawl,
            Err(e) => return Err(abort(&lifecycle, ProjectStatus::Failed, e).await),
        };

        if let Err(e) = self.scoring_phase(&lifecycle, &crawl).await {
            return Err(abort(&lifecycle, ProjectStatus::Error, e).await);
        }

        info!(
            target: "ux_audit::run",
            "Audit of project {} complete: {} pages scanned",
            project.id,
            crawl.recorded
        );

        Ok(RunSummary {
            project_id: project.id,
            pages_scanned: crawl.recorded,
        })
    }

    async fn resolve_project(
        &self,
        seed_url: &str,
        project_id: Option<ProjectId>,
    ) -> AuditResult<AuditProject> {
        let Some(id) = project_id else {
            return Ok(self.store.create_project(seed_url).await?);
        };

        // The frontier is not persisted, so a started project cannot be resumed
        let project = self.store.get_project(&id).await?;
        if project.status != ProjectStatus::Queued {
            return Err(AuditError::InvalidInput(format!(
                "project {id} is not queued ({})",
                project.status
            )));
        }
        if !self.store.read_pages_with_analyses(&id).await?.is_empty() {
            return Err(AuditError::InvalidInput(format!(
                "project {id} already has page records"
            )));
        }
        Ok(project)
    }

    async fn crawl_phase(
        &self,
        lifecycle: &LifecycleController,
        seed_url: &str,
        page_budget: usize,
    ) -> AuditResult<CrawlSummary> {
        lifecycle.start_crawling().await?;

        let mut renderer = self
            .renderers
            .acquire()
            .await
            .map_err(|e| AuditError::browser(&e))?;

        let processor = PageProcessor::new(
            lifecycle.project_id().clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.snapshots),
            Arc::clone(&self.engine),
            self.storage_dir.clone(),
            self.page_load_timeout,
        );

        let crawled = crawl_site(seed_url, page_budget, renderer.as_mut(), &processor, lifecycle).await;

        if let Err(e) = renderer.close().await {
            warn!(target: "ux_audit::run", "Failed to release renderer: {e:#}");
        }

        let crawl = crawled?;
        if crawl.recorded == 0 && self.fail_on_empty_crawl {
            return Err(AuditError::EmptyCrawl);
        }
        Ok(crawl)
    }

    async fn scoring_phase(
        &self,
        lifecycle: &LifecycleController,
        crawl: &CrawlSummary,
    ) -> AuditResult<()> {
        lifecycle.analyzing(crawl.analyzed).await?;
        lifecycle.compiling().await?;

        let result = ScoreAggregator::new(Arc::clone(&self.store))
            .aggregate(lifecycle.project_id())
            .await?;

        if let Some(reports) = &self.reports {
            lifecycle.generating_report().await?;
            reports
                .generate(lifecycle.project_id(), &result)
                .await
                .map_err(|e| AuditError::Report(format!("{e:#}")))?;
        }

        lifecycle.complete().await?;
        Ok(())
    }
}

/// Record the terminal status for `err` and hand it back for rethrow.
async fn abort(lifecycle: &LifecycleController, status: ProjectStatus, err: AuditError) -> AuditError {
    let message = match &err {
        AuditError::EmptyCrawl => err.to_string(),
        other => format!("Error: {other}"),
    };
    error!(
        target: "ux_audit::run",
        "Audit of project {} aborted: {err}",
        lifecycle.project_id()
    );

    if let Err(e) = lifecycle.transition(status, message).await {
        error!(
            target: "ux_audit::run",
            "Failed to mark project {} {status}: {e}",
            lifecycle.project_id()
        );
    }
    err
}

