//! Object Store Port - Byte-level read/write by URI.

use async_trait::async_trait;

use super::StoreError;

/// Port for reading and writing whole objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads an object. Missing objects are `StoreError::NotFound`.
    async fn get(&self, uri: &str) -> Result<Vec<u8>, StoreError>;

    /// Writes an object, replacing any previous content. Returns the URI the
    /// object can be read back from.
    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<String, StoreError>;
}
