//! File-based Result Cache Adapter
//!
//! Stores one JSON document per cache key under a directory, so partially
//! failed assessment runs can be resumed by a later process.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::assessment::CachedConfidence;
use crate::ports::{CacheError, ResultCache};

/// File-backed confidence cache.
///
/// # Directory Structure
///
/// ```text
/// {dir}/
/// ├── 3f2a...e1.json
/// └── 9bc0...44.json
/// ```
///
/// Writes go to `{key}.json.tmp` and are renamed into place, so concurrent
/// readers never see a partial entry.
#[derive(Debug, Clone)]
pub struct FileResultCache {
    dir: PathBuf,
}

impl FileResultCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        // Unique per writer so concurrent puts of one key do not collide.
        self.dir.join(format!(
            "{}.{}.json.tmp",
            sanitize_key(key),
            uuid::Uuid::new_v4().simple()
        ))
    }
}

/// Keys are hex digests; anything else is reduced to a safe file name.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl ResultCache for FileResultCache {
    async fn get(&self, key: &str) -> Result<Option<CachedConfidence>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Read(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // A corrupt entry is a miss; the next put overwrites it.
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &CachedConfidence) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            CacheError::Write(format!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| CacheError::Write(format!("Failed to serialize entry: {}", e)))?;

        let temp_path = self.temp_path(key);
        let final_path = self.entry_path(key);

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            CacheError::Write(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        file.write_all(&body).await.map_err(|e| {
            CacheError::Write(format!(
                "Failed to write temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        file.sync_all().await.map_err(|e| {
            CacheError::Write(format!(
                "Failed to sync temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        fs::rename(&temp_path, &final_path).await.map_err(|e| {
            CacheError::Write(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::AttributeConfidence;
    use crate::domain::foundation::{Score, Timestamp};
    use tempfile::TempDir;

    fn entry(confidence: f64) -> CachedConfidence {
        CachedConfidence {
            model: "mock-model-1".to_string(),
            entries: vec![AttributeConfidence {
                path: "Total".to_string(),
                confidence: Score::new(confidence),
                reason: "legible".to_string(),
            }],
            cached_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = FileResultCache::new(dir.path());
        assert!(cache.get("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn survives_a_new_instance() {
        let dir = TempDir::new().unwrap();
        let stored = entry(0.7);
        FileResultCache::new(dir.path().join("cache"))
            .put("abc123", &stored)
            .await
            .unwrap();

        let reopened = FileResultCache::new(dir.path().join("cache"));
        assert_eq!(reopened.get("abc123").await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn put_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = FileResultCache::new(dir.path());
        cache.put("k", &entry(0.2)).await.unwrap();
        cache.put("k", &entry(0.9)).await.unwrap();

        let got = cache.get("k").await.unwrap().unwrap();
        assert_eq!(got.entries[0].confidence, Score::new(0.9));
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let cache = FileResultCache::new(dir.path());
        assert!(cache.get("bad").await.unwrap().is_none());
    }

    #[test]
    fn keys_are_sanitized() {
        assert_eq!(sanitize_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_key("ab12-_"), "ab12-_");
    }
}
