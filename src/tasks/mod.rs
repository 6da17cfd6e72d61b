//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the memoizer.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired memory-backend entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
