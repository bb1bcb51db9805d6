//! Demonstrates a reaper releasing callers blocked on an expired query.
//!
//! Reads `REAPER_CACHE_*` variables (optionally from a `.env` file) and uses
//! Redis when it is reachable, the in-memory backend otherwise.

use reaper_cache::{Cache, CacheConfig, MemoryCache, Reaper, RedisCache, WaiterRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reaper_cache=debug")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = CacheConfig::from_env()?;

    let redis = Arc::new(RedisCache::new(config.clone()));
    let cache: Arc<dyn Cache> = match redis.connect().await {
        Ok(()) => redis as Arc<dyn Cache>,
        Err(e) => {
            info!("Redis unavailable ({}), falling back to the memory backend", e);
            let memory = Arc::new(MemoryCache::new());
            memory.connect().await?;
            memory
        }
    };

    let registry = WaiterRegistry::new();
    let token = CancellationToken::new();
    let reaper = Reaper::from_config(cache.clone(), registry.clone(), &config).spawn(token.clone());

    cache.store("q1", "payload", 2).await?;
    info!("q1 = {}", cache.retrieve("q1").await?);

    // A leader registers the query, followers wait on it. The leader never
    // finishes, so only the reaper can release them once q1 expires.
    let leader = registry.join("q1").await;
    let followers: Vec<_> = (0..3)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                let mut handle = registry.join("q1").await.handle;
                handle.closed().await;
                info!("follower {} released", i);
            })
        })
        .collect();

    for follower in followers {
        tokio::time::timeout(Duration::from_secs(10), follower).await??;
    }
    info!("leader handle closed: {}", leader.handle.is_closed());

    token.cancel();
    reaper.await?;
    cache.close().await?;
    Ok(())
}
