//! Score aggregation
//!
//! Turns the persisted per-page analyses of a project into one overall
//! score and a per-dimension breakdown:
//!
//! - a page's overall is the rounded mean of every dimension value it
//!   reported; pages without values are left out
//! - the project overall is the rounded mean of the page overalls, or 0
//! - each fixed dimension is the rounded mean over the pages that reported
//!   it, and 0 when no page did
//!
//! Aggregation is a full recompute every time, so running it twice on the
//! same data writes the same result.

use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assessment::Dimension;
use crate::persistence::{AuditStore, PageWithAnalysis, ProjectId, ProjectResult, StorageResult};

/// Rounded arithmetic mean of scores, `None` for an empty input.
///
/// Non-finite values are ignored and the result is clamped to `0..=100`.
#[must_use]
pub fn mean_score(values: impl IntoIterator<Item = f64>) -> Option<u8> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    let mean = (sum / f64::from(count)).round().clamp(0.0, 100.0);
    // Clamped to 0..=100 above
    Some(mean as u8)
}

/// Compute the project result from pages and their effective analyses.
#[must_use]
pub fn aggregate_scores(pages: &[PageWithAnalysis]) -> ProjectResult {
    let analyses: Vec<_> = pages.iter().filter_map(|p| p.analysis.as_ref()).collect();

    let page_overalls = analyses
        .iter()
        .filter_map(|a| mean_score(a.dimensions.values().copied()))
        .map(f64::from);
    let overall = mean_score(page_overalls).unwrap_or(0);

    let breakdown: BTreeMap<String, u8> = Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let reported = analyses
                .iter()
                .filter_map(|a| a.dimensions.get(dimension.key()).copied());
            // Zero-filled here even though pages never zero-fill
            (dimension.key().to_string(), mean_score(reported).unwrap_or(0))
        })
        .collect();

    ProjectResult { overall, breakdown }
}

/// Reads a project's analyses and writes its final score
#[derive(Clone)]
pub struct ScoreAggregator {
    store: Arc<dyn AuditStore>,
}

impl ScoreAggregator {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Recompute and persist the project's overall score and breakdown.
    pub async fn aggregate(&self, project_id: &ProjectId) -> StorageResult<ProjectResult> {
        let pages = self.store.read_pages_with_analyses(project_id).await?;
        let result = aggregate_scores(&pages);
        self.store.update_project_result(project_id, &result).await?;

        info!(
            target: "ux_audit::scoring",
            "Project {} scored {} over {} pages",
            project_id,
            result.overall,
            pages.len()
        );
        Ok(result)
    }
}
