//! TTL Policy Module
//!
//! Resolves how long a computed result stays in the store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_TTL_SECS;

// == TTL Policy ==
/// Expiry policy for a wrapped producer.
///
/// A resolved TTL of zero means "return the result but do not store it". Anything shorter than a
/// millisecond but above zero is stored for one millisecond.
pub enum Ttl<T> {
    /// Same TTL for every result
    Fixed(Duration),
    /// TTL chosen from the computed result
    Computed(Arc<dyn Fn(&T) -> Duration + Send + Sync>),
}

impl<T> Ttl<T> {
    /// A fixed TTL in whole seconds.
    pub fn fixed(secs: u64) -> Self {
        Ttl::Fixed(Duration::from_secs(secs))
    }

    /// A TTL derived from each successful result.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&T) -> Duration + Send + Sync + 'static,
    {
        Ttl::Computed(Arc::new(f))
    }

    /// Returns the TTL for `result`.
    ///
    /// Only ever called with a successful result.
    pub fn resolve(&self, result: &T) -> Duration {
        match self {
            Ttl::Fixed(ttl) => *ttl,
            Ttl::Computed(f) => f(result),
        }
    }
}

impl<T> Default for Ttl<T> {
    fn default() -> Self {
        Ttl::fixed(DEFAULT_TTL_SECS)
    }
}

impl<T> Clone for Ttl<T> {
    fn clone(&self) -> Self {
        match self {
            Ttl::Fixed(ttl) => Ttl::Fixed(*ttl),
            Ttl::Computed(f) => Ttl::Computed(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for Ttl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Fixed(ttl) => f.debug_tuple("Fixed").field(ttl).finish(),
            Ttl::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Whole seconds.
impl<T> From<u64> for Ttl<T> {
    fn from(secs: u64) -> Self {
        Ttl::fixed(secs)
    }
}

impl<T> From<Duration> for Ttl<T> {
    fn from(ttl: Duration) -> Self {
        Ttl::Fixed(ttl)
    }
}
