//! Memoizer Core
//!
//! Wraps async producers so results are served from the store while fresh, and concurrent misses
//! for the same arguments share one producer invocation.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, debug_span, warn, Instrument};

use crate::config::{Config, DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECS};
use crate::error::{MemoError, WriteOutcome};
use crate::memo::inflight::{Attachment, Completion, InFlightRegistry};
use crate::memo::key::{derive_call_key, store_key, Arguments, ProducerId};
use crate::memo::stats::{MemoStats, StatsSnapshot};
use crate::memo::ttl::Ttl;
use crate::store::{Backend, StoreAdapter};

/// What every caller attached to one computation receives.
type Outcome<T, E> = Result<T, MemoError<E>>;

type BoxedProducer<C, A, T, E> = Arc<dyn Fn(C, A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

// == Memoizer ==
/// Factory for memoized functions sharing one store.
#[derive(Debug, Clone)]
pub struct Memoizer {
    store: StoreAdapter,
    key_prefix: Arc<str>,
    default_ttl: u64,
}

impl Memoizer {
    // == Constructor ==
    /// Creates a memoizer over `backend` with the default key prefix and TTL.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            store: StoreAdapter::new(backend),
            key_prefix: Arc::from(DEFAULT_KEY_PREFIX),
            default_ttl: DEFAULT_TTL_SECS,
        }
    }

    /// Creates a memoizer over `backend` using the prefix and default TTL from `config`.
    pub fn from_config(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self::new(backend)
            .with_key_prefix(&config.key_prefix)
            .with_default_ttl(config.default_ttl)
    }

    /// Sets the namespace every store key starts with.
    pub fn with_key_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = Arc::from(prefix);
        self
    }

    /// Sets the TTL given to producers wrapped without one.
    pub fn with_default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl = secs;
        self
    }

    // == Wrap ==
    /// Memoizes `producer` under `name`.
    ///
    /// `name` is the producer's identity in the store: two producers must never share a name,
    /// and a producer must keep its name across restarts for stored results to be reused.
    ///
    /// ```ignore
    /// let square = memoizer.wrap("square", |(x,): (u64,)| async move {
    ///     Ok::<_, std::convert::Infallible>(x * x)
    /// });
    /// assert_eq!(square.call((12,)).await?, 144);
    /// ```
    pub fn wrap<A, T, E, F, Fut>(&self, name: &str, producer: F) -> Memoized<(), A, T, E>
    where
        A: Arguments,
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.wrap_with_context(name, move |_: (), args: A| producer(args))
    }

    /// Memoizes a producer that also takes a call context, such as the receiver of a method.
    ///
    /// The context is handed to the producer unchanged and plays no part in the cache key.
    pub fn wrap_with_context<C, A, T, E, F, Fut>(
        &self,
        name: &str,
        producer: F,
    ) -> Memoized<C, A, T, E>
    where
        C: Send + 'static,
        A: Arguments,
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
        F: Fn(C, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let producer: BoxedProducer<C, A, T, E> =
            Arc::new(move |ctx: C, args: A| producer(ctx, args).boxed());

        debug!("Wrapping producer {}", name);

        Memoized {
            name: Arc::from(name),
            producer_id: ProducerId::new(name),
            producer,
            ttl: Ttl::fixed(self.default_ttl),
            store: self.store.clone(),
            key_prefix: Arc::clone(&self.key_prefix),
            in_flight: InFlightRegistry::new(),
            stats: Arc::new(MemoStats::new()),
        }
    }
}

// == Memoized ==
/// A memoized async function.
///
/// Clones are cheap and share the in-flight registry and statistics. Configure the TTL with
/// [`with_ttl`](Self::with_ttl) before cloning; clones keep the policy they were made with.
pub struct Memoized<C, A, T, E> {
    name: Arc<str>,
    producer_id: ProducerId,
    producer: BoxedProducer<C, A, T, E>,
    ttl: Ttl<T>,
    store: StoreAdapter,
    key_prefix: Arc<str>,
    in_flight: InFlightRegistry<Outcome<T, E>>,
    stats: Arc<MemoStats>,
}

impl<C, A, T, E> Clone for Memoized<C, A, T, E> {
    fn clone(&self) -> Self {
        Memoized {
            name: Arc::clone(&self.name),
            producer_id: self.producer_id.clone(),
            producer: Arc::clone(&self.producer),
            ttl: self.ttl.clone(),
            store: self.store.clone(),
            key_prefix: Arc::clone(&self.key_prefix),
            in_flight: self.in_flight.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<C, A, T, E> std::fmt::Debug for Memoized<C, A, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .field("producer_id", &self.producer_id)
            .field("ttl", &self.ttl)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl<A, T, E> Memoized<(), A, T, E>
where
    A: Arguments,
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Calls the memoized function.
    pub async fn call(&self, args: A) -> Result<T, MemoError<E>> {
        self.call_with((), args).await
    }
}

impl<C, A, T, E> Memoized<C, A, T, E>
where
    C: Send + 'static,
    A: Arguments,
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Replaces the TTL policy: whole seconds, a [`Duration`](std::time::Duration), or a [`Ttl`].
    pub fn with_ttl(mut self, ttl: impl Into<Ttl<T>>) -> Self {
        self.ttl = ttl.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn producer_id(&self) -> &ProducerId {
        &self.producer_id
    }

    /// Current counters for this function and its clones.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of computations that have started and not yet been cleaned up.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// The store key a call with `args` reads and writes.
    pub fn key_for(&self, args: &A) -> Result<String, MemoError<E>> {
        let digest = derive_call_key(args).map_err(MemoError::serialization)?;
        Ok(store_key(&self.key_prefix, &self.producer_id, &digest))
    }

    // == Call ==
    /// Calls the memoized function with a call context.
    ///
    /// A live store entry is returned without running the producer. Otherwise the call joins the
    /// computation already running for these arguments, or starts one. Every caller joined to a
    /// computation gets the same outcome. Store failures only cost a recomputation.
    pub async fn call_with(&self, ctx: C, args: A) -> Result<T, MemoError<E>> {
        let digest = derive_call_key(&args).map_err(MemoError::serialization)?;
        let key = store_key(&self.key_prefix, &self.producer_id, &digest);

        match self.store.get::<T>(&key).await {
            Ok(Some(value)) => {
                self.stats.record_hit();
                debug!("{}: cache hit for {}", self.name, digest);
                return Ok(value);
            }
            Ok(None) => {
                self.stats.record_miss();
            }
            Err(err) => {
                self.stats.record_store_read_error();
                self.stats.record_miss();
                warn!("{}: store read failed for {}, recomputing: {}", self.name, key, err);
            }
        }

        let (channel, attachment) = self.in_flight.attach_or_create(digest.clone(), |completion| {
            self.spawn_computation(key, ctx, args, completion)
        });

        if attachment == Attachment::Joined {
            self.stats.record_coalesced();
            debug!("{}: joined in-flight computation for {}", self.name, digest);
        }

        channel
            .await
            .unwrap_or_else(|_cancelled| Err(MemoError::Interrupted))
    }

    /// Runs the producer in its own task so the computation outlives any single caller.
    ///
    /// Waiters are notified as soon as the outcome is known; the store write happens afterwards
    /// and the registry entry is only removed once it has settled.
    fn spawn_computation(
        &self,
        key: String,
        ctx: C,
        args: A,
        mut completion: Completion<Outcome<T, E>>,
    ) {
        self.stats.record_computation();

        let producer = Arc::clone(&self.producer);
        let ttl = self.ttl.clone();
        let store = self.store.clone();
        let stats = Arc::clone(&self.stats);
        let span = debug_span!("memo_compute", producer = %self.name, key = %key);

        let computation = async move {
            let value = match producer(ctx, args).await {
                Ok(value) => value,
                Err(err) => {
                    stats.record_producer_failure();
                    debug!("producer failed, nothing cached");
                    completion.remove();
                    completion.notify(Err(MemoError::Producer(Arc::new(err))));
                    return;
                }
            };

            let ttl = ttl.resolve(&value);
            let encoded = match serde_json::to_string(&value) {
                Ok(encoded) => encoded,
                Err(err) => {
                    warn!("result is not representable as JSON: {}", err);
                    completion.remove();
                    completion.notify(Err(MemoError::serialization(err)));
                    return;
                }
            };

            if ttl.is_zero() {
                // Nothing will be stored, so the next call must recompute
                completion.remove();
            }
            completion.notify(Ok(value));

            match store.set_with_ttl(&key, encoded, ttl).await {
                Ok(WriteOutcome::Written) => debug!("stored result for {:?}", ttl),
                Ok(WriteOutcome::Skipped) => stats.record_skipped_write(),
                Err(err) => {
                    stats.record_store_write_error();
                    warn!("store write failed, result not cached: {}", err);
                }
            }

            drop(completion);
        };

        tokio::spawn(computation.instrument(span));
    }
}
