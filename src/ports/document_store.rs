//! Document Store Port - Access to schemas and extracted section values.
//!
//! The engine never talks to a database or bucket directly. Callers
//! provide a store that can hand over the schema configured for a
//! document class and the values for a section.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::SectionId;

/// Errors raised by storage adapters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to parse {uri}: {reason}")]
    Parse { uri: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl StoreError {
    pub fn parse(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

/// Points at the stored values of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    pub section_id: SectionId,
    pub document_class: String,
    /// Location of the JSON values, resolved by the object store.
    pub uri: String,
}

impl SectionRef {
    pub fn new(section_id: SectionId, document_class: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            section_id,
            document_class: document_class.into(),
            uri: uri.into(),
        }
    }
}

/// Port for reading schemas and section values.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Schema configured for a document class. `Ok(None)` when none exists.
    async fn get_schema(&self, document_class: &str) -> Result<Option<Value>, StoreError>;

    /// Values stored for a section.
    async fn get_extracted_values(&self, section: &SectionRef) -> Result<Value, StoreError>;
}
