//! In-Memory Result Cache Adapter
//!
//! Holds confidence results for the lifetime of the process. Useful for
//! tests and for single-run resumption.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::assessment::CachedConfidence;
use crate::ports::{CacheError, ResultCache};

#[derive(Debug, Clone, Default)]
pub struct InMemoryResultCache {
    entries: Arc<RwLock<HashMap<String, CachedConfidence>>>,
}

impl InMemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached tasks.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear all entries (useful for tests)
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn get(&self, key: &str) -> Result<Option<CachedConfidence>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &CachedConfidence) -> Result<(), CacheError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}
