//! In-Memory Document Store
//!
//! Schemas keyed by document class and values keyed by URI. Useful for
//! testing and for callers that already hold the data.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{DocumentStore, SectionRef, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    schemas: Arc<RwLock<HashMap<String, Value>>>,
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_schema(&self, document_class: impl Into<String>, schema: Value) {
        self.schemas.write().await.insert(document_class.into(), schema);
    }

    pub async fn insert_values(&self, uri: impl Into<String>, values: Value) {
        self.values.write().await.insert(uri.into(), values);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_schema(&self, document_class: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.schemas.read().await.get(document_class).cloned())
    }

    async fn get_extracted_values(&self, section: &SectionRef) -> Result<Value, StoreError> {
        self.values
            .read()
            .await
            .get(&section.uri)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(section.uri.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SectionId;
    use serde_json::json;

    #[tokio::test]
    async fn returns_inserted_data() {
        let store = InMemoryDocumentStore::new();
        store.insert_schema("invoice", json!({"type": "object"})).await;
        store.insert_values("mem://s1", json!({"Total": 1})).await;

        assert!(store.get_schema("invoice").await.unwrap().is_some());
        assert!(store.get_schema("other").await.unwrap().is_none());

        let section = SectionRef::new(SectionId::new("s1").unwrap(), "invoice", "mem://s1");
        assert_eq!(store.get_extracted_values(&section).await.unwrap(), json!({"Total": 1}));

        let missing = SectionRef::new(SectionId::new("s2").unwrap(), "invoice", "mem://s2");
        assert!(matches!(
            store.get_extracted_values(&missing).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
