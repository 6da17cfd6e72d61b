//! Memo Module
//!
//! Memoization of async producers: key derivation, TTL policy, in-flight coalescing and the
//! lookup / compute / write-back protocol.

mod inflight;
mod key;
mod memoizer;
mod stats;
mod ttl;


// Re-export public types
pub use inflight::{Attachment, Completion, ComputationChannel, InFlightRegistry, RemovalToken};
pub use key::{derive_call_key, store_key, Arguments, ArgsDigest, ProducerId};
pub use memoizer::{Memoized, Memoizer};
pub use stats::{MemoStats, StatsSnapshot};
pub use ttl::Ttl;
