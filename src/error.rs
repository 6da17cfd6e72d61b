//! Error types for the memoizer
//!
//! Provides unified error handling using thiserror.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

// == Store Error Enum ==
/// Failures raised by a store backend.
///
/// These never reach callers of a memoized function: a failed read degrades to a cache miss and a
/// failed write is logged and counted.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The Redis client reported an error (connection loss, timeout, protocol error)
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored value could not be decoded back into the expected type
    #[error("Failed to decode stored value: {0}")]
    Decode(#[source] serde_json::Error),

    /// The backend refused the operation for a reason of its own
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// == Memo Error Enum ==
/// Error returned from a memoized call.
///
/// Every caller attached to the same in-flight computation receives a clone of the same error, so
/// payloads are reference counted.
#[derive(Error, Debug)]
pub enum MemoError<E> {
    /// The arguments or the result could not be represented as JSON
    #[error("Serialization failed: {0}")]
    Serialization(Arc<serde_json::Error>),

    /// The producer itself failed; passed through untouched
    #[error("Producer failed: {0}")]
    Producer(Arc<E>),

    /// The computation ended without an outcome (the producer panicked)
    #[error("Computation interrupted before producing a result")]
    Interrupted,
}

impl<E> MemoError<E> {
    /// Returns the producer's own error, if that is what this is.
    pub fn producer(&self) -> Option<&E> {
        match self {
            MemoError::Producer(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        MemoError::Serialization(Arc::new(err))
    }
}

impl<E> Clone for MemoError<E> {
    fn clone(&self) -> Self {
        match self {
            MemoError::Serialization(err) => MemoError::Serialization(Arc::clone(err)),
            MemoError::Producer(err) => MemoError::Producer(Arc::clone(err)),
            MemoError::Interrupted => MemoError::Interrupted,
        }
    }
}

// == Write Outcome ==
/// What a store write actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was handed to the backend
    Written,
    /// The TTL resolved to zero, nothing was stored
    Skipped,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOutcome::Written => f.write_str("written"),
            WriteOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Boom(&'static str);

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom: {}", self.0)
        }
    }

    #[test]
    fn test_producer_error_display() {
        let err: MemoError<Boom> = MemoError::Producer(Arc::new(Boom("disk")));
        assert_eq!(err.to_string(), "Producer failed: boom: disk");
    }

    #[test]
    fn test_clone_shares_payload() {
        let err: MemoError<Boom> = MemoError::Producer(Arc::new(Boom("x")));
        let cloned = err.clone();

        match (&err, &cloned) {
            (MemoError::Producer(a), MemoError::Producer(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected producer errors"),
        }
    }

    #[test]
    fn test_producer_accessor() {
        let err: MemoError<Boom> = MemoError::Producer(Arc::new(Boom("y")));
        assert_eq!(err.producer(), Some(&Boom("y")));

        let err: MemoError<Boom> = MemoError::Interrupted;
        assert!(err.producer().is_none());
    }

    #[test]
    fn test_serialization_error_display() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: MemoError<Boom> = MemoError::serialization(json_err);
        assert!(err.to_string().starts_with("Serialization failed"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("offline".to_string());
        assert_eq!(err.to_string(), "Store unavailable: offline");
    }
}
