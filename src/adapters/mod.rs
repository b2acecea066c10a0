//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to external systems:
//! - `llm` - Completion and embedding endpoints, retry wrappers, mocks
//! - `storage` - Object and document stores (filesystem, in-memory)
//! - `cache` - Confidence result caches (file, in-memory)
//! - `report` - Markdown report export

pub mod cache;
pub mod llm;
pub mod report;
pub mod storage;

pub use cache::{FileResultCache, InMemoryResultCache};
pub use llm::{
    AnthropicConfig, AnthropicProvider, MockEmbeddingProvider, MockLlmProvider,
    OpenAIEmbeddingConfig, OpenAIEmbeddingProvider, RetryingEmbeddingProvider, RetryingLlmProvider,
};
pub use report::HtmlReportExporter;
pub use storage::{FileDocumentStore, InMemoryDocumentStore, InMemoryObjectStore, LocalObjectStore};
