//! Test doubles shared by the ux_audit integration tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

use ux_audit::assessment::{Assessment, AssessmentEngine, AssessmentError};
use ux_audit::canonical_url::CanonicalUrl;
use ux_audit::config::AuditConfig;
use ux_audit::lifecycle::{ProjectStatus, StatusUpdate};
use ux_audit::orchestrator::AuditRunner;
use ux_audit::page_extractor::{PageRenderer, RendererFactory};
use ux_audit::persistence::{
    AuditProject, AuditStore, MemoryAuditStore, PageAnalysis, PageId, PageRecord,
    PageWithAnalysis, ProjectId, ProjectIssue, ProjectResult, StorageError, StorageResult,
};
use ux_audit::snapshot_store::{SnapshotRef, SnapshotStore};

pub const SEED: &str = "https://example.com/";

/// In-memory site: URL -> outbound hrefs, plus URLs that fail to load
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    links: HashMap<String, Vec<String>>,
    broken: HashSet<String>,
}

#[allow(dead_code)]
impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page with its hrefs in DOM order
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.links
            .insert(url.to_string(), links.iter().map(|l| (*l).to_string()).collect());
        self
    }

    /// Navigation to `url` fails
    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }
}

/// Hands out renderers over a [`FakeSite`] and counts what they did
#[derive(Default)]
pub struct FakeRendererFactory {
    site: Arc<FakeSite>,
    fail_acquire: bool,
    pub acquired: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub navigations: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeRendererFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            ..Self::default()
        }
    }

    /// A factory whose browser never starts
    pub fn unavailable() -> Self {
        Self {
            fail_acquire: true,
            ..Self::default()
        }
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RendererFactory for FakeRendererFactory {
    async fn acquire(&self) -> Result<Box<dyn PageRenderer>> {
        if self.fail_acquire {
            return Err(anyhow!("Failed to launch browser: no executable found"));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRenderer {
            site: Arc::clone(&self.site),
            current: None,
            closed: Arc::clone(&self.closed),
            navigations: Arc::clone(&self.navigations),
        }))
    }
}

struct FakeRenderer {
    site: Arc<FakeSite>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
    navigations: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.navigations.lock().await.push(url.to_string());
        if self.site.broken.contains(url) {
            self.current = None;
            return Err(anyhow!("Page navigation timeout after 30 seconds"));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn extract_links(&mut self) -> Result<Vec<String>> {
        let current = self.current.as_ref().ok_or_else(|| anyhow!("no page loaded"))?;
        Ok(self.site.links.get(current).cloned().unwrap_or_default())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        let current = self.current.as_ref().ok_or_else(|| anyhow!("no page loaded"))?;
        Ok(snapshot_bytes(current))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Snapshot bytes the fake renderer produces for a URL
pub fn snapshot_bytes(url: &str) -> Vec<u8> {
    format!("png:{url}").into_bytes()
}

fn url_of_snapshot(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_start_matches("png:")
        .to_string()
}

/// Engine that scores every page, except the URLs it is told to fail on
#[derive(Default)]
pub struct ScriptedEngine {
    scores: HashMap<String, BTreeMap<String, f64>>,
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scores(mut self, url: &str, dimensions: &[(&str, f64)]) -> Self {
        self.scores.insert(
            url.to_string(),
            dimensions
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        );
        self
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssessmentEngine for ScriptedEngine {
    async fn analyze(&self, snapshot_png: &[u8]) -> Result<Assessment, AssessmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = url_of_snapshot(snapshot_png);

        if self.failing.contains(&url) {
            return Err(AssessmentError::Engine {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let dimensions = self
            .scores
            .get(&url)
            .cloned()
            .unwrap_or_else(|| BTreeMap::from([("usability".to_string(), 80.0)]));

        Ok(Assessment {
            dimensions,
            issues: vec![],
            summary: format!("Assessment of {url}"),
            positive_highlights: vec![],
        })
    }
}

/// Snapshot store in memory; keys containing `fail_marker` are rejected
#[derive(Default)]
pub struct MemorySnapshotStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_marker: Option<String>,
}

#[allow(dead_code)]
impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn put(&self, bytes: &[u8], key: &str) -> StorageResult<SnapshotRef> {
        if let Some(marker) = &self.fail_marker {
            if key.contains(marker.as_str()) {
                return Err(StorageError::Database(format!("upload rejected for {key}")));
            }
        }
        self.objects
            .lock()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(SnapshotRef {
            key: key.to_string(),
            url: format!("memory://{key}"),
        })
    }
}

/// Which store operation a [`FaultyStore`] breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// `update_project_status` fails for this status
    Status(ProjectStatus),
    /// `update_project_status` fails for labels starting with this text
    Label(&'static str),
    /// `update_project_result` fails
    Result,
    /// `save_analysis` fails
    SaveAnalysis,
}

/// Wraps a [`MemoryAuditStore`] and fails one kind of write
pub struct FaultyStore {
    pub inner: Arc<MemoryAuditStore>,
    fault: StoreFault,
}

#[allow(dead_code)]
impl FaultyStore {
    pub fn new(fault: StoreFault) -> Self {
        Self {
            inner: Arc::new(MemoryAuditStore::new()),
            fault,
        }
    }
}

fn injected() -> StorageError {
    StorageError::Database("injected fault".to_string())
}

#[async_trait]
impl AuditStore for FaultyStore {
    async fn create_project(&self, seed_url: &str) -> StorageResult<AuditProject> {
        self.inner.create_project(seed_url).await
    }

    async fn get_project(&self, id: &ProjectId) -> StorageResult<AuditProject> {
        self.inner.get_project(id).await
    }

    async fn create_page_record(
        &self,
        project_id: &ProjectId,
        url: &CanonicalUrl,
        snapshot: &SnapshotRef,
    ) -> StorageResult<PageRecord> {
        self.inner.create_page_record(project_id, url, snapshot).await
    }

    async fn save_analysis(
        &self,
        page_id: &PageId,
        assessment: Assessment,
    ) -> StorageResult<PageAnalysis> {
        if self.fault == StoreFault::SaveAnalysis {
            return Err(injected());
        }
        self.inner.save_analysis(page_id, assessment).await
    }

    async fn update_project_status(
        &self,
        id: &ProjectId,
        update: &StatusUpdate,
    ) -> StorageResult<()> {
        match self.fault {
            StoreFault::Status(status) if status == update.status => return Err(injected()),
            StoreFault::Label(prefix) if update.message.starts_with(prefix) => {
                return Err(injected());
            }
            _ => {}
        }
        self.inner.update_project_status(id, update).await
    }

    async fn update_project_result(
        &self,
        id: &ProjectId,
        result: &ProjectResult,
    ) -> StorageResult<()> {
        if self.fault == StoreFault::Result {
            return Err(injected());
        }
        self.inner.update_project_result(id, result).await
    }

    async fn read_pages_with_analyses(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<PageWithAnalysis>> {
        self.inner.read_pages_with_analyses(project_id).await
    }

    async fn list_project_issues(
        &self,
        project_id: &ProjectId,
    ) -> StorageResult<Vec<ProjectIssue>> {
        self.inner.list_project_issues(project_id).await
    }
}

/// Runner wired to fakes, plus handles to inspect them afterwards
pub struct Harness {
    pub config: AuditConfig,
    pub snapshots: Arc<MemorySnapshotStore>,
    pub engine: Arc<ScriptedEngine>,
    pub renderers: Arc<FakeRendererFactory>,
    _storage: TempDir,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(site: FakeSite) -> Self {
        Self::with_parts(site, ScriptedEngine::new(), MemorySnapshotStore::new())
    }

    pub fn with_engine(site: FakeSite, engine: ScriptedEngine) -> Self {
        Self::with_parts(site, engine, MemorySnapshotStore::new())
    }

    pub fn with_parts(site: FakeSite, engine: ScriptedEngine, snapshots: MemorySnapshotStore) -> Self {
        Self::from_factory(FakeRendererFactory::new(site), engine, snapshots)
    }

    pub fn from_factory(
        renderers: FakeRendererFactory,
        engine: ScriptedEngine,
        snapshots: MemorySnapshotStore,
    ) -> Self {
        let storage = TempDir::new().expect("temp dir");
        let config = AuditConfig::builder()
            .seed_url(SEED)
            .storage_dir(storage.path())
            .build()
            .expect("valid config");

        Self {
            config,
            snapshots: Arc::new(snapshots),
            engine: Arc::new(engine),
            renderers: Arc::new(renderers),
            _storage: storage,
        }
    }

    pub fn runner(&self, store: Arc<dyn AuditStore>) -> AuditRunner {
        AuditRunner::new(
            &self.config,
            store,
            self.snapshots.clone(),
            self.engine.clone(),
            self.renderers.clone(),
        )
    }
}

/// Page URLs of a project in record order
#[allow(dead_code)]
pub async fn recorded_urls(store: &dyn AuditStore, project_id: &ProjectId) -> Vec<String> {
    store
        .read_pages_with_analyses(project_id)
        .await
        .expect("pages readable")
        .into_iter()
        .map(|entry| entry.page.url.as_str().to_string())
        .collect()
}

/// The single project a test run created
#[allow(dead_code)]
pub async fn only_project(store: &MemoryAuditStore) -> AuditProject {
    let mut projects = store.projects().await;
    assert_eq!(projects.len(), 1, "expected exactly one project");
    projects.remove(0)
}
