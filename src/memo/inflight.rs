//! In-Flight Registry Module
//!
//! Per-producer map of computations that have started but not yet settled. Concurrent misses for
//! the same arguments attach to the existing computation instead of starting their own.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;

use crate::memo::key::ArgsDigest;

/// Handle to an outcome that every attached caller can await.
pub type ComputationChannel<V> = Shared<oneshot::Receiver<V>>;
type ComputationMap<V> = Arc<Mutex<HashMap<ArgsDigest, ComputationChannel<V>>>>;

// == Attachment ==
/// How a caller got its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// This caller created the entry and its start routine ran
    Started,
    /// An entry already existed; the start routine was not run
    Joined,
}

// == Removal Token ==
/// Removes a registry entry when dropped.
///
/// Dropping is the only way to fire it, so the entry goes away exactly once on every exit path
/// of the computation, panics included.
pub struct RemovalToken {
    f: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl RemovalToken {
    fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        RemovalToken {
            f: Some(Box::new(f)),
        }
    }
}

impl Drop for RemovalToken {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

impl fmt::Debug for RemovalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalToken")
            .field("armed", &self.f.is_some())
            .finish()
    }
}

// == Completion ==
/// Given to the start routine: the means to settle a computation.
///
/// Dropping it without calling [`notify`](Self::notify) removes the entry and wakes every waiter
/// with a cancellation.
pub struct Completion<V> {
    // Field order matters: the entry is removed before waiters see a dropped sender.
    token: Option<RemovalToken>,
    sender: Option<oneshot::Sender<V>>,
}

impl<V> Completion<V> {
    /// Delivers `outcome` to every caller attached now or until the entry is removed.
    pub fn notify(&mut self, outcome: V) {
        if let Some(sender) = self.sender.take() {
            // Nobody listening is fine, the computation still ran to completion
            sender.send(outcome).ok();
        }
    }

    /// Removes the registry entry; later calls start a fresh computation.
    pub fn remove(&mut self) {
        self.token.take();
    }
}

impl<V> fmt::Debug for Completion<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("removed", &self.token.is_none())
            .field("notified", &self.sender.is_none())
            .finish()
    }
}

// == In-Flight Registry ==
/// Deduplicates concurrent computations by argument digest.
pub struct InFlightRegistry<V> {
    computations: ComputationMap<V>,
}

impl<V> Clone for InFlightRegistry<V> {
    fn clone(&self) -> Self {
        InFlightRegistry {
            computations: Arc::clone(&self.computations),
        }
    }
}

impl<V> Default for InFlightRegistry<V> {
    fn default() -> Self {
        InFlightRegistry {
            computations: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V> fmt::Debug for InFlightRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("in_flight", &self.computations.lock().len())
            .finish()
    }
}

impl<V> InFlightRegistry<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    // == Attach Or Create ==
    /// Returns the handle of the computation running for `key`, starting one if there is none.
    ///
    /// `start` runs at most once per created entry, after the entry is visible to other callers,
    /// and must not block: it is expected to spawn the actual work and settle the [`Completion`]
    /// from there.
    pub fn attach_or_create<F>(&self, key: ArgsDigest, start: F) -> (ComputationChannel<V>, Attachment)
    where
        F: FnOnce(Completion<V>),
    {
        let (completion, channel) = {
            let mut computations = self.computations.lock();
            if let Some(channel) = computations.get(&key) {
                return (channel.clone(), Attachment::Joined);
            }

            let (sender, receiver) = oneshot::channel();
            let channel = receiver.shared();

            let registry = Arc::clone(&self.computations);
            let removed_key = key.clone();
            let token = RemovalToken::new(move || {
                registry.lock().remove(&removed_key);
            });

            let evicted = computations.insert(key, channel.clone());
            debug_assert!(evicted.is_none());

            (
                Completion {
                    token: Some(token),
                    sender: Some(sender),
                },
                channel,
            )
        };

        start(completion);
        (channel, Attachment::Started)
    }

    // == Inspection ==
    /// Returns true if a computation for `key` has not settled yet.
    pub fn contains(&self, key: &ArgsDigest) -> bool {
        self.computations.lock().contains_key(key)
    }

    /// Number of unsettled computations.
    pub fn len(&self) -> usize {
        self.computations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.computations.lock().is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::key::derive_call_key;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn digest_of(n: u32) -> ArgsDigest {
        derive_call_key(&(n,)).unwrap()
    }

    #[tokio::test]
    async fn test_joiners_share_one_start() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let mut pending = Vec::new();

        let (first, attachment) = registry.attach_or_create(digest_of(1), |completion| {
            starts.fetch_add(1, Ordering::SeqCst);
            pending.push(completion);
        });
        assert_eq!(attachment, Attachment::Started);

        for _ in 0..5 {
            let (_, attachment) = registry.attach_or_create(digest_of(1), |_| {
                starts.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(attachment, Attachment::Joined);
        }
        let (second, _) = registry.attach_or_create(digest_of(1), |_| unreachable!());

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);

        let mut completion = pending.pop().unwrap();
        completion.notify(7);
        completion.remove();

        assert_eq!(first.await.unwrap(), 7);
        assert_eq!(second.await.unwrap(), 7);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_start_separately() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        let mut pending = Vec::new();

        let (_, a) = registry.attach_or_create(digest_of(1), |c| pending.push(c));
        let (_, b) = registry.attach_or_create(digest_of(2), |c| pending.push(c));

        assert_eq!(a, Attachment::Started);
        assert_eq!(b, Attachment::Started);
        assert_eq!(registry.len(), 2);

        drop(pending);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_completion_cancels_and_removes() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();

        let (channel, _) = registry.attach_or_create(digest_of(3), drop);

        assert!(!registry.contains(&digest_of(3)));
        assert!(channel.await.is_err());
    }

    #[tokio::test]
    async fn test_entry_visible_until_removed() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();
        let mut pending = Vec::new();

        let (channel, _) = registry.attach_or_create(digest_of(4), |c| pending.push(c));
        let mut completion = pending.pop().unwrap();

        completion.notify(9);
        assert!(registry.contains(&digest_of(4)));

        // A late joiner still gets the settled outcome
        let (late, attachment) = registry.attach_or_create(digest_of(4), |_| unreachable!());
        assert_eq!(attachment, Attachment::Joined);
        assert_eq!(late.await.unwrap(), 9);

        completion.remove();
        assert!(!registry.contains(&digest_of(4)));
        assert_eq!(channel.await.unwrap(), 9);

        // Removing twice is harmless
        completion.remove();
        drop(completion);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_new_entry_after_removal() {
        let registry: InFlightRegistry<u32> = InFlightRegistry::new();

        let (first, _) = registry.attach_or_create(digest_of(5), |mut c| {
            c.notify(1);
        });
        assert_eq!(first.await.unwrap(), 1);
        assert!(registry.is_empty());

        let (second, attachment) = registry.attach_or_create(digest_of(5), |mut c| {
            c.notify(2);
        });
        assert_eq!(attachment, Attachment::Started);
        assert_eq!(second.await.unwrap(), 2);
    }
}
