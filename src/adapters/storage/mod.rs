//! Storage Adapters
//!
//! Implementations of the `ObjectStore` and `DocumentStore` ports.
//!
//! ## Available Adapters
//!
//! - **LocalObjectStore** - Objects as files below a root directory
//! - **InMemoryObjectStore** - Objects in memory (testing/development)
//! - **FileDocumentStore** - Schemas from a directory, values from files
//! - **InMemoryDocumentStore** - Schemas and values in memory
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileDocumentStore, LocalObjectStore};
//!
//! let documents = FileDocumentStore::new("./schemas");
//! let reports = LocalObjectStore::new("./out");
//! ```

mod file_document_store;
mod in_memory_document_store;
mod in_memory_object_store;
mod local_object_store;

pub use file_document_store::{parse_document, FileDocumentStore};
pub use in_memory_document_store::InMemoryDocumentStore;
pub use in_memory_object_store::InMemoryObjectStore;
pub use local_object_store::LocalObjectStore;
