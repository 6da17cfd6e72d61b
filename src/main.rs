//! Redis Memoizer - demonstration binary
//!
//! Wraps a deliberately slow producer, fires a burst of concurrent calls at it and reports how
//! they were served.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_memoizer::{spawn_cleanup_task, Backend, Config, MemoryBackend, Memoizer, RedisBackend};

/// Number of concurrent calls in the demonstration burst.
const BURST_SIZE: usize = 10;

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect to Redis, or fall back to the in-process backend with its cleanup task
/// 4. Wrap the demonstration producer and run a burst of calls against it
/// 5. Log the statistics and stop background tasks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redis_memoizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Redis Memoizer");

    let config = Config::from_env();
    info!(
        "Configuration loaded: redis_url={:?}, default_ttl={}s, key_prefix={}, cleanup_interval={}s",
        config.redis_url, config.default_ttl, config.key_prefix, config.cleanup_interval
    );

    let (backend, cleanup_handle) = connect_backend(&config).await?;
    let memoizer = Memoizer::from_config(backend, &config);

    let slow_square = memoizer.wrap("demo::slow_square", |(x,): (u64,)| async move {
        info!("Computing square of {}", x);
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok::<_, Infallible>(x * x)
    });

    let started = Instant::now();
    let burst = (0..BURST_SIZE).map(|_| {
        let slow_square = slow_square.clone();
        tokio::spawn(async move { slow_square.call((12,)).await })
    });
    for result in join_all(burst).await {
        let value = result.context("call task panicked")??;
        info!("Burst call returned {}", value);
    }
    info!("Burst of {} calls took {:?}", BURST_SIZE, started.elapsed());

    let started = Instant::now();
    let value = slow_square.call((12,)).await?;
    info!("Repeat call returned {} in {:?}", value, started.elapsed());

    let stats = serde_json::to_string(&slow_square.stats())?;
    info!("Stats: {}", stats);

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Picks the backend named by the configuration.
///
/// Without `REDIS_URL` results live in process memory, swept by a background task whose handle
/// is returned alongside.
async fn connect_backend(
    config: &Config,
) -> anyhow::Result<(Arc<dyn Backend>, Option<JoinHandle<()>>)> {
    match &config.redis_url {
        Some(url) => {
            let backend: Arc<dyn Backend> = Arc::new(
                RedisBackend::connect(url)
                    .await
                    .with_context(|| format!("connecting to {}", url))?,
            );
            Ok((backend, None))
        }
        None => {
            info!("REDIS_URL not set, using in-process memory backend");
            let backend = Arc::new(MemoryBackend::new());
            let handle = spawn_cleanup_task(backend.clone(), config.cleanup_interval);
            let backend: Arc<dyn Backend> = backend;
            Ok((backend, Some(handle)))
        }
    }
}
