//! Stored Entry Module
//!
//! Defines a single memory-backend record with its absolute expiry.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

// == Stored Entry ==
/// A serialized result held by the memory backend.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The encoded value
    pub value: String,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates an entry expiring `ttl` from now.
    pub fn new(value: String, ttl: Duration) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to its expiry, so a
    /// fully elapsed TTL is never served.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
