//! Store Module
//!
//! Adapter between the memoizer and the external key-value store.

mod adapter;
mod backend;
mod entry;
mod memory;
mod redis_backend;

// Re-export public types
pub use adapter::StoreAdapter;
pub use backend::Backend;
pub use entry::StoredEntry;
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;
