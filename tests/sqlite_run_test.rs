//! Full run persisted to SQLite, with the JSON report stage

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use ux_audit::AuditError;
use ux_audit::lifecycle::ProjectStatus;
use ux_audit::persistence::{
    AuditStore, MemoryAuditStore, ProjectId, ProjectResult, SqliteAuditStore,
};
use ux_audit::report::{JsonReportWriter, ReportGenerator};

mod common;
use common::{FakeSite, Harness, SEED, ScriptedEngine, only_project};

#[tokio::test]
async fn test_run_persists_to_sqlite_and_writes_report() -> Result<()> {
    let dir = TempDir::new()?;
    let store = Arc::new(SqliteAuditStore::open(&dir.path().join("audits.db")).await?);

    let site = FakeSite::new().page(SEED, &["/pricing", "/docs"]);
    let engine = ScriptedEngine::new()
        .scores(SEED, &[("usability", 90.0), ("clarity", 70.0)])
        .scores("https://example.com/pricing", &[("usability", 60.0)])
        .failing_on("https://example.com/docs");
    let harness = Harness::with_engine(site, engine);

    let reports = Arc::new(JsonReportWriter::new(store.clone(), dir.path().join("reports")));
    let summary = harness
        .runner(store.clone())
        .with_report_generator(reports.clone())
        .run(SEED, None, 5)
        .await?;
    assert_eq!(summary.pages_scanned, 3);

    let project = store.get_project(&summary.project_id).await?;
    assert_eq!(project.status, ProjectStatus::Completed);
    assert_eq!(project.step, 5);
    // Pages: 80 and 60
    assert_eq!(project.score, Some(70));

    let pages = store.read_pages_with_analyses(&summary.project_id).await?;
    let urls: Vec<&str> = pages.iter().map(|p| p.page.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            SEED,
            "https://example.com/pricing",
            "https://example.com/docs"
        ]
    );
    assert!(pages[2].analysis.is_none());

    let report: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(reports.report_path(&summary.project_id)).await?)?;
    assert_eq!(report["result"]["overall"], 70);
    assert_eq!(report["project"]["status"], "generating_report");
    assert_eq!(report["pages"].as_array().map(Vec::len), Some(3));

    store.close().await;
    Ok(())
}

struct BrokenReport;

#[async_trait]
impl ReportGenerator for BrokenReport {
    async fn generate(&self, _project_id: &ProjectId, _result: &ProjectResult) -> Result<()> {
        Err(anyhow!("renderer crashed"))
    }
}

#[tokio::test]
async fn test_report_failure_marks_project_error() -> Result<()> {
    let harness = Harness::new(FakeSite::new().page(SEED, &[]));
    let store = Arc::new(MemoryAuditStore::new());

    let err = harness
        .runner(store.clone())
        .with_report_generator(Arc::new(BrokenReport))
        .run(SEED, None, 1)
        .await
        .expect_err("run fails");
    assert!(matches!(err, AuditError::Report(_)), "{err:?}");

    let project = only_project(&store).await;
    assert_eq!(project.status, ProjectStatus::Error);
    assert_eq!(project.step, 4);
    assert_eq!(project.message, "Error: Report generation failed: renderer crashed");
    // The score was written before the report stage
    assert_eq!(project.score, Some(80));
    Ok(())
}
