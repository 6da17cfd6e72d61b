//! Memory Backend Module
//!
//! In-process store with TTL expiration, for single-process deployments and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::error::Result;
use crate::store::{Backend, StoredEntry};

// == Memory Backend ==
/// HashMap-backed store honoring per-entry expiry.
///
/// Expired entries read as absent immediately and are physically removed by
/// [`cleanup_expired`](Self::cleanup_expired), usually driven by
/// [`spawn_cleanup_task`](crate::tasks::spawn_cleanup_task).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns every stored key, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                trace!("memory backend: {} expired", key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = StoredEntry::new(value, ttl);
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = MemoryBackend::new();

        backend.set_with_expiry("k", "\"v\"".to_string(), MINUTE).await.unwrap();

        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("\"v\""));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let backend = MemoryBackend::new();
        assert!(backend.get("missing").await.unwrap().is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_resets_value() {
        let backend = MemoryBackend::new();

        backend.set_with_expiry("k", "1".to_string(), MINUTE).await.unwrap();
        backend.set_with_expiry("k", "2".to_string(), MINUTE).await.unwrap();

        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("2"));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let backend = MemoryBackend::new();

        backend
            .set_with_expiry("k", "1".to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(backend.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(backend.get("k").await.unwrap().is_none());
        // Still physically present until swept
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let backend = MemoryBackend::new();

        backend
            .set_with_expiry("short", "1".to_string(), Duration::from_millis(300))
            .await
            .unwrap();
        backend
            .set_with_expiry("long", "2".to_string(), Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        let removed = backend.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(backend.keys(), vec!["long".to_string()]);
    }

    #[tokio::test]
    async fn test_sub_second_expiry() {
        let backend = MemoryBackend::new();

        backend
            .set_with_expiry("k", "1".to_string(), Duration::from_millis(200))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(backend.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(backend.get("k").await.unwrap().is_none());
    }
}
