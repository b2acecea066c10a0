//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! ## Inference Ports
//!
//! - `LlmProvider` - Completions for judging and confidence scoring
//! - `EmbeddingProvider` - Text embeddings for semantic comparison
//! - `RetryPolicy` - Backoff and retryable-predicate applied to both
//!
//! ## Storage Ports
//!
//! - `DocumentStore` - Schemas by document class and section values
//! - `ObjectStore` - Raw object read/write for inputs and reports
//! - `ResultCache` - Confidence results reused across runs
//! - `ReportExporter` - Markdown to HTML conversion

mod document_store;
mod embedding_provider;
mod llm_provider;
mod object_store;
mod report_exporter;
mod result_cache;
mod retry_policy;

pub use document_store::{DocumentStore, SectionRef, StoreError};
pub use embedding_provider::EmbeddingProvider;
pub use llm_provider::{
    CallPurpose, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider,
    Message, MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use object_store::ObjectStore;
pub use report_exporter::{ExportError, ReportExporter};
pub use result_cache::{CacheError, ResultCache};
pub use retry_policy::{RetryPolicy, RetryPredicate};
