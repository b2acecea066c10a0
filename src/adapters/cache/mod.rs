//! Result Cache Adapters
//!
//! - **InMemoryResultCache** - Process-lifetime cache (tests, single runs)
//! - **FileResultCache** - One JSON file per key, survives restarts

mod file_result_cache;
mod in_memory_result_cache;

pub use file_result_cache::FileResultCache;
pub use in_memory_result_cache::InMemoryResultCache;
