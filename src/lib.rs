//! Redis Memoizer - memoization of async functions over Redis
//!
//! Results are stored with a TTL, and concurrent calls for the same arguments share one
//! computation instead of stampeding the producer.

pub mod config;
pub mod digest;
pub mod error;
pub mod memo;
pub mod store;
pub mod tasks;

pub use config::Config;
pub use error::{MemoError, StoreError};
pub use memo::{Memoized, Memoizer, Ttl};
pub use store::{Backend, MemoryBackend, RedisBackend};
pub use tasks::spawn_cleanup_task;
