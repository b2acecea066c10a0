//! Result Cache Port - Reuse of confidence results across runs.
//!
//! Keys are content hashes, so a cache may be shared by concurrent tasks and
//! across runs. Implementations must tolerate concurrent `put`s.

use async_trait::async_trait;

use crate::domain::assessment::CachedConfidence;

/// Errors raised by cache adapters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    #[error("Cache read failed: {0}")]
    Read(String),

    #[error("Cache write failed: {0}")]
    Write(String),
}

/// Port for caching confidence results.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachedConfidence>, CacheError>;

    async fn put(&self, key: &str, value: &CachedConfidence) -> Result<(), CacheError>;
}
