//! Project lifecycle controller
//!
//! The controller is the only writer of a project's status. Callers push
//! transitions at their checkpoints; the controller enforces that progress
//! steps never go backwards and that terminal states stick.

pub mod status;

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::persistence::{AuditProject, AuditStore, ProjectId, StorageError};

pub use status::{ProjectStatus, StatusUpdate};

/// Errors raised while moving a project through its lifecycle
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cannot move project from {from} (step {from_step}) back to {to} (step {to_step})")]
    Regression {
        from: ProjectStatus,
        from_step: u8,
        to: ProjectStatus,
        to_step: u8,
    },

    #[error("Failed to persist project status: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy)]
struct Position {
    status: ProjectStatus,
    step: u8,
}

/// Drives one project's status, step and progress label
pub struct LifecycleController {
    store: Arc<dyn AuditStore>,
    project_id: ProjectId,
    position: Mutex<Position>,
}

impl LifecycleController {
    /// Start from the project's persisted status.
    pub fn new(store: Arc<dyn AuditStore>, project: &AuditProject) -> Self {
        Self {
            store,
            project_id: project.id.clone(),
            position: Mutex::new(Position {
                status: project.status,
                step: project.step,
            }),
        }
    }

    #[must_use]
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub async fn status(&self) -> ProjectStatus {
        self.position.lock().await.status
    }

    pub async fn start_crawling(&self) -> Result<(), LifecycleError> {
        self.transition(ProjectStatus::Crawling, "Starting crawler...")
            .await
    }

    /// Per-page progress while crawling
    pub async fn crawl_progress(&self, recorded: usize, budget: usize) -> Result<(), LifecycleError> {
        self.transition(
            ProjectStatus::Crawling,
            format!("Crawled {recorded}/{budget} pages"),
        )
        .await
    }

    pub async fn analyzing(&self, analyzed: usize) -> Result<(), LifecycleError> {
        self.transition(
            ProjectStatus::Analyzing,
            format!("Analyzed {analyzed} pages"),
        )
        .await
    }

    pub async fn compiling(&self) -> Result<(), LifecycleError> {
        self.transition(ProjectStatus::Compiling, "Compiling scores...")
            .await
    }

    pub async fn generating_report(&self) -> Result<(), LifecycleError> {
        self.transition(ProjectStatus::GeneratingReport, "Generating report...")
            .await
    }

    pub async fn complete(&self) -> Result<(), LifecycleError> {
        self.transition(ProjectStatus::Completed, "Audit complete")
            .await
    }

    /// Terminal failure of the crawl phase
    pub async fn fail(&self, message: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(ProjectStatus::Failed, message).await
    }

    /// Terminal failure after crawling finished
    pub async fn error(&self, message: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(ProjectStatus::Error, message).await
    }

    /// Apply one transition.
    ///
    /// No-op once the project is terminal. Failure states keep the step
    /// already reached; every other status must not lower the step.
    pub async fn transition(
        &self,
        status: ProjectStatus,
        message: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        let message = message.into();
        let mut position = self.position.lock().await;

        if position.status.is_terminal() {
            debug!(
                target: "ux_audit::lifecycle",
                "Project {} already {}, ignoring {status}",
                self.project_id,
                position.status
            );
            return Ok(());
        }

        let step = match status.step() {
            Some(step) if step < position.step => {
                return Err(LifecycleError::Regression {
                    from: position.status,
                    from_step: position.step,
                    to: status,
                    to_step: step,
                });
            }
            Some(step) => step,
            None => position.step,
        };

        let update = StatusUpdate {
            status,
            step,
            message,
        };
        self.store
            .update_project_status(&self.project_id, &update)
            .await?;

        if status.is_failure() {
            warn!(target: "ux_audit::lifecycle", "Project {} {status}: {}", self.project_id, update.message);
        } else {
            info!(
                target: "ux_audit::lifecycle",
                "Project {} step {step}/{}: {}",
                self.project_id,
                crate::utils::LIFECYCLE_STEPS,
                update.message
            );
        }

        *position = Position { status, step };
        Ok(())
    }
}
