//! File-based Document Store
//!
//! Schemas live in a directory as `{document_class}.json`, `.yaml` or
//! `.yml`. Section values are read through a `LocalObjectStore` and parsed
//! as YAML when the URI says so, JSON otherwise.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::LocalObjectStore;
use crate::ports::{DocumentStore, ObjectStore, SectionRef, StoreError};

const SCHEMA_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Parses a stored document by URI extension.
pub fn parse_document(uri: &str, bytes: &[u8]) -> Result<Value, StoreError> {
    let lower = uri.to_ascii_lowercase();
    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml::from_slice(bytes).map_err(|e| StoreError::parse(uri, e.to_string()))
    } else {
        serde_json::from_slice(bytes).map_err(|e| StoreError::parse(uri, e.to_string()))
    }
}

/// Document store over the local filesystem.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    schema_dir: PathBuf,
    values: LocalObjectStore,
}

impl FileDocumentStore {
    /// Schemas from `schema_dir`; value URIs relative to the working directory.
    pub fn new<P: AsRef<Path>>(schema_dir: P) -> Self {
        Self {
            schema_dir: schema_dir.as_ref().to_path_buf(),
            values: LocalObjectStore::new("."),
        }
    }

    /// Resolve value URIs below `root` instead.
    pub fn with_values_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.values = LocalObjectStore::new(root);
        self
    }

    async fn find_schema(&self, document_class: &str) -> Option<PathBuf> {
        for ext in SCHEMA_EXTENSIONS {
            let candidate = self.schema_dir.join(format!("{}.{}", document_class, ext));
            if fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get_schema(&self, document_class: &str) -> Result<Option<Value>, StoreError> {
        if document_class.contains(['/', '\\']) || document_class.contains("..") {
            return Err(StoreError::Io(format!(
                "Invalid document class name: {}",
                document_class
            )));
        }
        let Some(path) = self.find_schema(document_class).await else {
            return Ok(None);
        };
        let bytes = fs::read(&path)
            .await
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let uri = path.display().to_string();
        parse_document(&uri, &bytes).map(Some)
    }

    async fn get_extracted_values(&self, section: &SectionRef) -> Result<Value, StoreError> {
        let bytes = self.values.get(&section.uri).await?;
        parse_document(&section.uri, &bytes)
    }
}
