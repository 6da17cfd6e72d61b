//! Store Backend Trait
//!
//! The two operations the memoizer needs from a key-value store.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A networked (or in-process) key-value store with server-side expiry.
///
/// Implementations store opaque text; encoding is handled by
/// [`StoreAdapter`](crate::store::StoreAdapter).
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Returns the stored text, or `None` when the key is missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// Callers never pass a zero TTL. Backends with coarser expiry than `ttl` round up, never
    /// down.
    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}
