//! Local Filesystem Object Store
//!
//! Treats object URIs as paths below a root directory. A `file://` prefix
//! is accepted and stripped; absolute paths are used as-is.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::ports::{ObjectStore, StoreError};

/// Maximum object size accepted on write (50 MB).
const MAX_OBJECT_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// Filesystem-backed object store.
///
/// Writes are atomic: content goes to `{name}.tmp`, is synced, then renamed.
///
/// ```rust,ignore
/// let store = LocalObjectStore::new("./out");
/// let uri = store.put("reports/doc-1/report.md", body, "text/markdown").await?;
/// ```
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a URI to a filesystem path.
    fn resolve(&self, uri: &str) -> Result<PathBuf, StoreError> {
        let raw = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        if raw.as_os_str().is_empty() {
            return Err(StoreError::Io("empty object URI".to_string()));
        }
        if raw.is_relative() && raw.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(StoreError::Io(format!("URI escapes store root: {}", uri)));
        }
        Ok(self.root.join(raw))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, uri: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(uri)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(path.display().to_string()),
            _ => StoreError::Io(format!("Failed to read {}: {}", path.display(), e)),
        })
    }

    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        if body.len() > MAX_OBJECT_SIZE_BYTES {
            return Err(StoreError::Io(format!(
                "Object too large: {} bytes (max {})",
                body.len(),
                MAX_OBJECT_SIZE_BYTES
            )));
        }

        let final_path = self.resolve(uri)?;
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut temp_name = final_path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        file.write_all(&body).await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to write temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        file.sync_all().await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to sync temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        fs::rename(&temp_path, &final_path).await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %final_path.display(), content_type, bytes = body.len(), "Object written");
        Ok(final_path.display().to_string())
    }
}
