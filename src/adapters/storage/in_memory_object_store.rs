//! In-Memory Object Store
//!
//! Keeps objects in a map keyed by URI. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{ObjectStore, StoreError};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// In-memory object store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object body as UTF-8 text, if present.
    pub async fn get_text(&self, uri: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(uri)
            .map(|o| String::from_utf8_lossy(&o.body).into_owned())
    }

    pub async fn content_type(&self, uri: &str) -> Option<String> {
        self.objects.read().await.get(uri).map(|o| o.content_type.clone())
    }

    /// All stored URIs, sorted.
    pub async fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.objects.read().await.keys().cloned().collect();
        uris.sort();
        uris
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, uri: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .await
            .get(uri)
            .map(|o| o.body.clone())
            .ok_or_else(|| StoreError::NotFound(uri.to_string()))
    }

    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        self.objects.write().await.insert(
            uri.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(uri.to_string())
    }
}
