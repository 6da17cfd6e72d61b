//! Store Adapter Module
//!
//! Typed JSON layer over a [`Backend`], with the zero-TTL no-op rule.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{Result, StoreError, WriteOutcome};
use crate::store::Backend;

// == Store Adapter ==
/// Reads and writes JSON-encoded values through a shared backend.
#[derive(Debug, Clone)]
pub struct StoreAdapter {
    backend: Arc<dyn Backend>,
}

impl StoreAdapter {
    // == Constructor ==
    /// Wraps a backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    // == Get ==
    /// Fetches and decodes the value under `key`.
    ///
    /// Returns `Ok(None)` when nothing live is stored. Stored text that does not decode as `T` is a
    /// [`StoreError::Decode`].
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.get(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(StoreError::Decode)
    }

    // == Set With TTL ==
    /// Stores already-encoded JSON under `key` for `ttl`.
    ///
    /// A zero TTL stores nothing and reports [`WriteOutcome::Skipped`].
    pub async fn set_with_ttl(
        &self,
        key: &str,
        encoded: String,
        ttl: Duration,
    ) -> Result<WriteOutcome> {
        if ttl.is_zero() {
            trace!("ttl is zero, not storing {}", key);
            return Ok(WriteOutcome::Skipped);
        }

        self.backend.set_with_expiry(key, encoded, ttl).await?;
        Ok(WriteOutcome::Written)
    }
}
