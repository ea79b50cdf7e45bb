// UX audit worker
//
// Runs one audit for a seed URL: crawl, snapshot, assess, score. Progress
// and results are written to the SQLite database; the process exits non-zero
// when the audit fails.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use ux_audit::assessment::{GeminiConfig, GeminiEngine};
use ux_audit::config::{AuditConfig, Plan};
use ux_audit::orchestrator::AuditRunner;
use ux_audit::page_extractor::ChromiumLauncher;
use ux_audit::persistence::{AuditStore, ProjectId, SqliteAuditStore};
use ux_audit::report::JsonReportWriter;
use ux_audit::snapshot_store::FsSnapshotStore;

#[derive(Parser)]
#[command(name = "ux-audit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crawl a site, snapshot every page and score its UX", long_about = None)]
struct Cli {
    /// Seed URL; `https://` is assumed when no scheme is given
    url: String,

    /// Run an existing queued project instead of creating one
    #[arg(long)]
    project_id: Option<String>,

    /// Maximum number of pages to record
    #[arg(long, env = "PAGE_LIMIT")]
    page_limit: Option<usize>,

    /// Derive the page limit from a plan
    #[arg(long, value_enum)]
    plan: Option<Plan>,

    /// SQLite database file
    #[arg(long, env = "AUDIT_DATABASE")]
    database: Option<PathBuf>,

    /// Directory for transient local snapshots
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Durable snapshot directory
    #[arg(long, default_value = "snapshots")]
    snapshot_dir: PathBuf,

    /// Public base URL the snapshot directory is served from
    #[arg(long)]
    snapshot_base_url: Option<String>,

    /// Write a JSON report per project into this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Chrome/Chromium binary to launch
    #[arg(long, env = "CHROMIUM_PATH")]
    chrome_executable: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .try_init()
        .ok();
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("ux-audit").join("audits.db"))
        .unwrap_or_else(|| PathBuf::from("ux-audit.db"))
}

fn build_config(cli: &Cli) -> Result<AuditConfig> {
    let mut builder = AuditConfig::builder()
        .seed_url(cli.url.clone())
        .headless(!cli.headed);

    if let Some(plan) = cli.plan {
        builder = builder.plan(plan);
    }
    if let Some(limit) = cli.page_limit {
        builder = builder.page_budget(limit);
    }
    if let Some(dir) = &cli.storage_dir {
        builder = builder.storage_dir(dir.clone());
    }
    if let Some(path) = &cli.chrome_executable {
        builder = builder.chrome_executable(path.clone());
    }

    builder.build()
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    let database = cli.database.clone().unwrap_or_else(default_database_path);
    let store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::open(&database)
            .await
            .with_context(|| format!("Failed to open database {}", database.display()))?,
    );

    let mut snapshots = FsSnapshotStore::new(cli.snapshot_dir.clone());
    if let Some(base_url) = &cli.snapshot_base_url {
        snapshots = snapshots.with_public_base_url(base_url.clone());
    }

    let engine = GeminiEngine::new(GeminiConfig::from_env())
        .context("Failed to configure the assessment engine")?;

    let mut runner = AuditRunner::new(
        &config,
        Arc::clone(&store),
        Arc::new(snapshots),
        Arc::new(engine),
        Arc::new(ChromiumLauncher::new(config.clone())),
    );
    if let Some(dir) = &cli.report_dir {
        runner = runner.with_report_generator(Arc::new(JsonReportWriter::new(
            Arc::clone(&store),
            dir.clone(),
        )));
    }

    let project_id = cli.project_id.as_deref().map(ProjectId::from);
    let summary = runner.run_config(&config, project_id).await?;
    let project = store.get_project(&summary.project_id).await?;

    info!(
        project_id = %summary.project_id,
        pages_scanned = summary.pages_scanned,
        score = ?project.score,
        "Audit finished"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&project).context("Failed to serialize project")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Audit failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
