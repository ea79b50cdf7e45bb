//! Persisted records: projects, pages, page analyses and issues

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::assessment::{Assessment, Issue};
use crate::canonical_url::CanonicalUrl;
use crate::lifecycle::ProjectStatus;
use crate::snapshot_store::SnapshotRef;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

record_id!(
    /// Audit project identifier
    ProjectId
);
record_id!(
    /// Page record identifier
    PageId
);
record_id!(
    /// Page analysis identifier
    AnalysisId
);

/// One end-to-end audit run against a seed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditProject {
    pub id: ProjectId,
    pub seed_url: String,
    pub status: ProjectStatus,
    pub step: u8,
    pub message: String,
    /// Set once the project completes
    pub score: Option<u8>,
    pub breakdown: Option<BTreeMap<String, u8>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AuditProject {
    #[must_use]
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            seed_url: seed_url.into(),
            status: ProjectStatus::Queued,
            step: 0,
            message: "Queued".to_string(),
            score: None,
            breakdown: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// A successfully snapshotted and persisted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: PageId,
    pub project_id: ProjectId,
    pub url: CanonicalUrl,
    pub snapshot: SnapshotRef,
    pub created_at: DateTime<Utc>,
}

/// Stored assessment of one page. Never updated; re-analysis adds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub id: AnalysisId,
    pub page_id: PageId,
    pub dimensions: BTreeMap<String, f64>,
    pub issues: Vec<Issue>,
    pub summary: String,
    pub positive_highlights: Vec<String>,
    /// Mean of the page's own dimensions, `None` when it has none
    pub overall_score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl PageAnalysis {
    #[must_use]
    pub fn from_assessment(page_id: PageId, assessment: Assessment) -> Self {
        let overall_score = assessment.overall_score();
        Self {
            id: AnalysisId::new(),
            page_id,
            dimensions: assessment.dimensions,
            issues: assessment.issues,
            summary: assessment.summary,
            positive_highlights: assessment.positive_highlights,
            overall_score,
            created_at: Utc::now(),
        }
    }
}

/// A page together with its effective (latest) analysis, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageWithAnalysis {
    pub page: PageRecord,
    pub analysis: Option<PageAnalysis>,
}

/// Project-wide, flattened issue row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectIssue {
    pub page_id: PageId,
    pub page_url: CanonicalUrl,
    #[serde(flatten)]
    pub issue: Issue,
}

/// Final score written to the project by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub overall: u8,
    pub breakdown: BTreeMap<String, u8>,
}
