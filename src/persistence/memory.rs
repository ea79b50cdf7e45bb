//! In-memory [`AuditStore`] backed by `HashMap`s behind an async mutex.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::models::{
    AuditProject, PageAnalysis, PageId, PageRecord, PageWithAnalysis, ProjectId, ProjectIssue,
    ProjectResult,
};
use super::{AuditStore, StorageError, StorageResult, flatten_issues};
use crate::assessment::Assessment;
use crate::canonical_url::CanonicalUrl;
use crate::lifecycle::{ProjectStatus, StatusUpdate};
use crate::snapshot_store::SnapshotRef;

#[derive(Debug, Default)]
struct State {
    projects: HashMap<ProjectId, AuditProject>,
    /// Page records in creation order
    pages: Vec<PageRecord>,
    /// Analyses per page in save order
    analyses: HashMap<PageId, Vec<PageAnalysis>>,
    status_history: HashMap<ProjectId, Vec<StatusUpdate>>,
}

/// Audit store that keeps everything in process memory.
///
/// Also records every status write per project, which tests use to check
/// the order of lifecycle transitions.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    state: Mutex<State>,
}

impl MemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All projects, oldest first
    pub async fn projects(&self) -> Vec<AuditProject> {
        let state = self.state.lock().await;
        let mut projects: Vec<AuditProject> = state.projects.values().cloned().collect();
        projects.sort_by_key(|p| p.created_at);
        projects
    }

    /// Every status update written for a project, oldest first
    pub async fn status_history(&self, id: &ProjectId) -> Vec<StatusUpdate> {
        let state = self.state.lock().await;
        state.status_history.get(id).cloned().unwrap_or_default()
    }

    /// Number of analyses saved across all pages of a project
    pub async fn analysis_count(&self, project_id: &ProjectId) -> usize {
        let state = self.state.lock().await;
        state
            .pages
            .iter()
            .filter(|p| &p.project_id == project_id)
            .map(|p| state.analyses.get(&p.id).map_or(0, Vec::len))
            .sum()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn create_project(&self, seed_url: &str) -> StorageResult<AuditProject> {
        let project = AuditProject::new(seed_url);
        let mut state = self.state.lock().await;
        state.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: &ProjectId) -> StorageResult<AuditProject> {
        let state = self.state.lock().await;
        state
            .projects
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::project_not_found(id))
    }

    async fn create_page_record(
        &self,
        project_id: &ProjectId,
        url: &CanonicalUrl,
        snapshot: &SnapshotRef,
    ) -> StorageResult<PageRecord> {
        let mut state = self.state.lock().await;
        if !state.projects.contains_key(project_id) {
            return Err(StorageError::project_not_found(project_id));
        }
        let record = PageRecord {
            id: PageId::new(),
            project_id: project_id.clone(),
            url: url.clone(),
            snapshot: snapshot.clone(),
            created_at: Utc::now(),
        };
        state.pages.push(record.clone());
        Ok(record)
    }

    async fn save_analysis(
        &self,
        page_id: &PageId,
        assessment: Assessment,
    ) -> StorageResult<PageAnalysis> {
        let mut state = self.state.lock().await;
        if !state.pages.iter().any(|p| &p.id == page_id) {
            return Err(StorageError::page_not_found(page_id));
        }
        let analysis = PageAnalysis::from_assessment(page_id.clone(), assessment);
        state
            .analyses
            .entry(page_id.clone())
            .or_default()
            .push(analysis.clone());
        Ok(analysis)
    }

    async fn update_project_status(
        &self,
        id: &ProjectId,
        update: &StatusUpdate,
    ) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let project = state
            .projects
            .get_mut(id)
            .ok_or_else(|| StorageError::project_not_found(id))?;
        project.status = update.status;
        project.step = update.step;
        project.message = update.message.clone();
        if update.status == ProjectStatus::Completed {
            project.completed_at = Some(Utc::now());
        }
        state
            .status_history
            .entry(id.clone())
            .or_default()
            .push(update.clone());
        Ok(())
    }

    async fn update_project_result(
        &self,
        id: &ProjectId,
        result: &ProjectResult,
    ) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let project = state
            .projects
            .get_mut(id)
            .ok_or_else(|| StorageError::project_not_found(id))?;
        project.score = Some(result.overall);
        project.breakdown = Some(result.breakdown.clone());
        Ok(())
    }

    async fn read_pages_with_analyses(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<PageWithAnalysis>> {
        let state = self.state.lock().await;
        if !state.projects.contains_key(project_id) {
            return Err(StorageError::project_not_found(project_id));
        }
        Ok(state
            .pages
            .iter()
            .filter(|p| &p.project_id == project_id)
            .map(|page| PageWithAnalysis {
                page: page.clone(),
                analysis: state
                    .analyses
                    .get(&page.id)
                    .and_then(|all| all.last())
                    .cloned(),
            })
            .collect())
    }

    async fn list_project_issues(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<ProjectIssue>> {
        let pages = self.read_pages_with_analyses(project_id).await?;
        Ok(flatten_issues(pages))
    }
}
