//! Report stage collaborators
//!
//! A [`ReportGenerator`] runs after scoring, while the project sits in
//! `generating_report`. [`JsonReportWriter`] writes one JSON document per
//! project with its score, pages and flattened issues.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::persistence::{
    AuditProject, AuditStore, PageWithAnalysis, ProjectId, ProjectIssue, ProjectResult,
};

/// Produces the deliverable for a scored project
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, project_id: &ProjectId, result: &ProjectResult) -> Result<()>;
}

/// Full report document
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub project: AuditProject,
    pub result: ProjectResult,
    pub pages: Vec<PageWithAnalysis>,
    pub issues: Vec<ProjectIssue>,
    pub generated_at: DateTime<Utc>,
}

/// Writes `<dir>/<project_id>.json`
pub struct JsonReportWriter {
    store: Arc<dyn AuditStore>,
    dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(store: Arc<dyn AuditStore>, dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.into(),
        }
    }

    #[must_use]
    pub fn report_path(&self, project_id: &ProjectId) -> PathBuf {
        self.dir.join(format!("{project_id}.json"))
    }

    async fn build(&self, project_id: &ProjectId, result: &ProjectResult) -> Result<AuditReport> {
        let project = self.store.get_project(project_id).await?;
        let pages = self.store.read_pages_with_analyses(project_id).await?;
        let issues = self.store.list_project_issues(project_id).await?;

        Ok(AuditReport {
            project,
            result: result.clone(),
            pages,
            issues,
            generated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl ReportGenerator for JsonReportWriter {
    async fn generate(&self, project_id: &ProjectId, result: &ProjectResult) -> Result<()> {
        let report = self
            .build(project_id, result)
            .await
            .with_context(|| format!("Failed to collect report data for project {project_id}"))?;

        let json = serde_json::to_vec_pretty(&report).context("Failed to serialize report")?;
        let path = self.report_path(project_id);
        write_report(&path, &json).await?;

        info!(
            target: "ux_audit::report",
            "Wrote report for project {project_id} ({} pages, {} issues) to {}",
            report.pages.len(),
            report.issues.len(),
            path.display()
        );
        Ok(())
    }
}

async fn write_report(path: &Path, json: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report {}", path.display()))
}
