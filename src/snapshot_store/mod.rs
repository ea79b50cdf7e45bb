//! Durable storage for page snapshots

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::persistence::{StorageError, StorageResult};

/// Stable reference to a stored snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotRef {
    /// Store-relative key, `<project_id>/<file>.png`
    pub key: String,
    /// URL the snapshot can be fetched from
    pub url: String,
}

/// Snapshot storage contract.
///
/// `put` is idempotent per key: storing again under the same key replaces
/// the bytes and returns the same reference.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put(&self, bytes: &[u8], key: &str) -> StorageResult<SnapshotRef>;
}

/// Snapshot store writing files under a root directory
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsSnapshotStore {
    /// Store under `root`, handing out `file://` URLs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    /// Hand out `<base_url>/<key>` instead of `file://` URLs, for roots
    /// that are served over HTTP.
    #[must_use]
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        self.public_base_url = Some(base.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let confined = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !confined {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("snapshot key escapes the store root: {key}"),
            )));
        }
        Ok(self.root.join(relative))
    }

    fn url_for(&self, key: &str, path: &Path) -> StorageResult<String> {
        if let Some(base) = &self.public_base_url {
            return Ok(format!("{base}/{key}"));
        }
        let absolute = std::path::absolute(path)?;
        Url::from_file_path(&absolute)
            .map(String::from)
            .map_err(|()| {
                StorageError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("cannot express {} as a file URL", absolute.display()),
                ))
            })
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn put(&self, bytes: &[u8], key: &str) -> StorageResult<SnapshotRef> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(target: "ux_audit::snapshot", "Stored {} bytes at {}", bytes.len(), path.display());

        Ok(SnapshotRef {
            key: key.to_string(),
            url: self.url_for(key, &path)?,
        })
    }
}
