//! Redis Backend Module
//!
//! Store backend talking to a Redis server with `GET` / `PSETEX`.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, instrument};

use crate::error::Result;
use crate::store::Backend;

// == Redis Backend ==
/// Shared Redis connection, reconnecting automatically after failures.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    url: String,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("url", &self.url)
            .finish()
    }
}

impl RedisBackend {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;

        info!("Connected to Redis at {}", url);

        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.pset_ex(key, value, expiry_millis(ttl)).await?;
        Ok(())
    }
}

/// Milliseconds for `PSETEX`, rounded up so a positive TTL never becomes zero.
fn expiry_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_millis() + u128::from(ttl.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_millis_keeps_whole_milliseconds() {
        assert_eq!(expiry_millis(Duration::from_millis(500)), 500);
        assert_eq!(expiry_millis(Duration::from_millis(1_900)), 1_900);
        assert_eq!(expiry_millis(Duration::from_secs(120)), 120_000);
    }

    #[test]
    fn test_expiry_millis_rounds_up() {
        assert_eq!(expiry_millis(Duration::from_nanos(1)), 1);
        assert_eq!(expiry_millis(Duration::from_micros(1_500)), 2);
    }

    #[test]
    fn test_expiry_millis_saturates() {
        assert_eq!(expiry_millis(Duration::MAX), u64::MAX);
    }
}
