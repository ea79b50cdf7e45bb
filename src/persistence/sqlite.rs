//! SQLite-backed [`AuditStore`].
//!
//! Schema:
//! - `projects`: one row per audit project, breakdown stored as JSON
//! - `pages`: page records, `seq` preserves creation order
//! - `page_analyses`: append-only, the highest `seq` per page is effective
//! - `issues`: flattened issues of each analysis, `position` keeps order

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::models::{
    AnalysisId, AuditProject, PageAnalysis, PageId, PageRecord, PageWithAnalysis, ProjectId,
    ProjectIssue, ProjectResult,
};
use super::{AuditStore, StorageError, StorageResult, flatten_issues};
use crate::assessment::{Assessment, Dimension, Issue, Severity};
use crate::canonical_url::CanonicalUrl;
use crate::lifecycle::{ProjectStatus, StatusUpdate};
use crate::snapshot_store::SnapshotRef;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    seed_url TEXT NOT NULL,
    status TEXT NOT NULL,
    step INTEGER NOT NULL,
    message TEXT NOT NULL,
    score INTEGER,
    breakdown TEXT,
    created_at INTEGER NOT NULL,
    completed_at INTEGER
);

CREATE TABLE IF NOT EXISTS pages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    project_id TEXT NOT NULL REFERENCES projects(id),
    url TEXT NOT NULL,
    snapshot_key TEXT NOT NULL,
    snapshot_url TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_project ON pages(project_id);

CREATE TABLE IF NOT EXISTS page_analyses (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    page_id TEXT NOT NULL REFERENCES pages(id),
    dimensions TEXT NOT NULL,
    summary TEXT NOT NULL,
    positive_highlights TEXT NOT NULL,
    overall_score INTEGER,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_analyses_page ON page_analyses(page_id);

CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id TEXT NOT NULL REFERENCES page_analyses(id),
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    severity TEXT NOT NULL,
    category TEXT NOT NULL,
    suggestion TEXT
);

CREATE INDEX IF NOT EXISTS idx_issues_analysis ON issues(analysis_id);
"#;

/// Durable audit store using SQLite in WAL mode.
#[derive(Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteAuditStore {
    /// Open the database at `path`, creating it and its schema if missing.
    pub async fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        // Idempotent: every statement is CREATE ... IF NOT EXISTS
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn require_project(&self, id: &ProjectId) -> StorageResult<()> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM projects WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        exists
            .map(|_| ())
            .ok_or_else(|| StorageError::project_not_found(id))
    }

    async fn issues_for(&self, analysis_id: &str) -> StorageResult<Vec<Issue>> {
        let rows = sqlx::query(
            r#"
            SELECT title, description, severity, category, suggestion
            FROM issues
            WHERE analysis_id = ?
            ORDER BY position
            "#,
        )
        .bind(analysis_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(issue_from_row).collect()
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(value: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| StorageError::Database(format!("timestamp out of range: {value}")))
}

fn score_to_db(score: Option<u8>) -> Option<i64> {
    score.map(i64::from)
}

fn score_from_db(value: Option<i64>) -> StorageResult<Option<u8>> {
    value
        .map(|v| {
            u8::try_from(v).map_err(|_| StorageError::Database(format!("score out of range: {v}")))
        })
        .transpose()
}

fn project_from_row(row: &SqliteRow) -> StorageResult<AuditProject> {
    let status: String = row.try_get("status")?;
    let step: i64 = row.try_get("step")?;
    let breakdown: Option<String> = row.try_get("breakdown")?;
    let completed_at: Option<i64> = row.try_get("completed_at")?;

    Ok(AuditProject {
        id: ProjectId(row.try_get("id")?),
        seed_url: row.try_get("seed_url")?,
        status: status.parse::<ProjectStatus>().map_err(StorageError::Database)?,
        step: u8::try_from(step)
            .map_err(|_| StorageError::Database(format!("step out of range: {step}")))?,
        message: row.try_get("message")?,
        score: score_from_db(row.try_get("score")?)?,
        breakdown: breakdown
            .map(|json| serde_json::from_str::<BTreeMap<String, u8>>(&json))
            .transpose()?,
        created_at: from_millis(row.try_get("created_at")?)?,
        completed_at: completed_at.map(from_millis).transpose()?,
    })
}

fn page_from_row(row: &SqliteRow) -> StorageResult<PageRecord> {
    Ok(PageRecord {
        id: PageId(row.try_get("id")?),
        project_id: ProjectId(row.try_get("project_id")?),
        url: CanonicalUrl::from_stored(row.try_get("url")?),
        snapshot: SnapshotRef {
            key: row.try_get("snapshot_key")?,
            url: row.try_get("snapshot_url")?,
        },
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

/// Analysis row without its issues, which live in their own table
fn analysis_from_row(row: &SqliteRow) -> StorageResult<PageAnalysis> {
    let dimensions: String = row.try_get("dimensions")?;
    let highlights: String = row.try_get("positive_highlights")?;
    Ok(PageAnalysis {
        id: AnalysisId(row.try_get("id")?),
        page_id: PageId(row.try_get("page_id")?),
        dimensions: serde_json::from_str(&dimensions)?,
        issues: Vec::new(),
        summary: row.try_get("summary")?,
        positive_highlights: serde_json::from_str(&highlights)?,
        overall_score: score_from_db(row.try_get("overall_score")?)?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

fn issue_from_row(row: &SqliteRow) -> StorageResult<Issue> {
    let severity: String = row.try_get("severity")?;
    let category: String = row.try_get("category")?;
    Ok(Issue {
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        severity: severity.parse::<Severity>().map_err(StorageError::Database)?,
        category: category.parse::<Dimension>().map_err(StorageError::Database)?,
        suggestion: row.try_get("suggestion")?,
    })
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn create_project(&self, seed_url: &str) -> StorageResult<AuditProject> {
        let project = AuditProject::new(seed_url);
        sqlx::query(
            r#"
            INSERT INTO projects (id, seed_url, status, step, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id.as_str())
        .bind(&project.seed_url)
        .bind(project.status.as_str())
        .bind(i64::from(project.step))
        .bind(&project.message)
        .bind(millis(project.created_at))
        .execute(&self.pool)
        .await?;
        Ok(project)
    }

    async fn get_project(&self, id: &ProjectId) -> StorageResult<AuditProject> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::project_not_found(id))?;
        project_from_row(&row)
    }

    async fn create_page_record(
        &self,
        project_id: &ProjectId,
        url: &CanonicalUrl,
        snapshot: &SnapshotRef,
    ) -> StorageResult<PageRecord> {
        self.require_project(project_id).await?;

        let record = PageRecord {
            id: PageId::new(),
            project_id: project_id.clone(),
            url: url.clone(),
            snapshot: snapshot.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO pages (id, project_id, url, snapshot_key, snapshot_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.project_id.as_str())
        .bind(record.url.as_str())
        .bind(&record.snapshot.key)
        .bind(&record.snapshot.url)
        .bind(millis(record.created_at))
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn save_analysis(
        &self,
        page_id: &PageId,
        assessment: Assessment,
    ) -> StorageResult<PageAnalysis> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM pages WHERE id = ?")
            .bind(page_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StorageError::page_not_found(page_id));
        }

        let analysis = PageAnalysis::from_assessment(page_id.clone(), assessment);
        let dimensions = serde_json::to_string(&analysis.dimensions)?;
        let highlights = serde_json::to_string(&analysis.positive_highlights)?;

        // Analysis and its issues land together or not at all
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO page_analyses
                (id, page_id, dimensions, summary, positive_highlights, overall_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(analysis.id.as_str())
        .bind(page_id.as_str())
        .bind(&dimensions)
        .bind(&analysis.summary)
        .bind(&highlights)
        .bind(score_to_db(analysis.overall_score))
        .bind(millis(analysis.created_at))
        .execute(&mut *tx)
        .await?;

        for (position, issue) in analysis.issues.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO issues
                    (analysis_id, position, title, description, severity, category, suggestion)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(analysis.id.as_str())
            .bind(position as i64)
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(issue.severity.as_str())
            .bind(issue.category.key())
            .bind(issue.suggestion.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(analysis)
    }

    async fn update_project_status(
        &self,
        id: &ProjectId,
        update: &StatusUpdate,
    ) -> StorageResult<()> {
        let completed_at =
            (update.status == ProjectStatus::Completed).then(|| millis(Utc::now()));

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET status = ?, step = ?, message = ?,
                completed_at = COALESCE(?, completed_at)
            WHERE id = ?
            "#,
        )
        .bind(update.status.as_str())
        .bind(i64::from(update.step))
        .bind(&update.message)
        .bind(completed_at)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::project_not_found(id));
        }
        Ok(())
    }

    async fn update_project_result(
        &self,
        id: &ProjectId,
        result: &ProjectResult,
    ) -> StorageResult<()> {
        let breakdown = serde_json::to_string(&result.breakdown)?;
        let outcome = sqlx::query("UPDATE projects SET score = ?, breakdown = ? WHERE id = ?")
            .bind(i64::from(result.overall))
            .bind(&breakdown)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if outcome.rows_affected() == 0 {
            return Err(StorageError::project_not_found(id));
        }
        Ok(())
    }

    async fn read_pages_with_analyses(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<PageWithAnalysis>> {
        self.require_project(project_id).await?;

        let page_rows = sqlx::query("SELECT * FROM pages WHERE project_id = ? ORDER BY seq")
            .bind(project_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        let pages: Vec<PageRecord> = page_rows
            .iter()
            .map(page_from_row)
            .collect::<StorageResult<_>>()?;

        // Ascending seq, so the last row seen per page is its effective analysis
        let analysis_rows = sqlx::query(
            r#"
            SELECT a.*
            FROM page_analyses a
            JOIN pages p ON a.page_id = p.id
            WHERE p.project_id = ?
            ORDER BY a.seq
            "#,
        )
        .bind(project_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut latest: HashMap<String, PageAnalysis> = HashMap::new();
        for row in &analysis_rows {
            let analysis = analysis_from_row(row)?;
            latest.insert(analysis.page_id.as_str().to_string(), analysis);
        }

        let mut result = Vec::with_capacity(pages.len());
        for page in pages {
            let analysis = match latest.remove(page.id.as_str()) {
                Some(mut analysis) => {
                    analysis.issues = self.issues_for(analysis.id.as_str()).await?;
                    Some(analysis)
                }
                None => None,
            };
            result.push(PageWithAnalysis { page, analysis });
        }

        Ok(result)
    }

    async fn list_project_issues(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<ProjectIssue>> {
        let pages = self.read_pages_with_analyses(project_id).await?;
        Ok(flatten_issues(pages))
    }
}
