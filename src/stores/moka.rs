use async_trait::async_trait;
use moka::Expiry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cache::Cache;
use crate::error::CacheError;
use crate::utils::ttl_duration;

const BACKEND: &str = "moka";

/// Configuration for MokaCache.
#[derive(Debug, Clone)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    pub max_capacity: u64,
}

impl Default for MokaCacheConfig {
    fn default() -> Self {
        MokaCacheConfig {
            max_capacity: 10_000,
        }
    }
}

#[derive(Clone)]
struct MokaValue {
    value: String,
    ttl: Option<Duration>,
}

/// Per-entry expiry: every write restarts the entry's own TTL.
struct TtlExpiry;

impl Expiry<String, MokaValue> for TtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &MokaValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &MokaValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Concurrent in-process cache using Moka.
///
/// Unlike [`MemoryCache`](crate::MemoryCache), expiry and capacity eviction
/// run inside Moka, so reads never take a write lock.
pub struct MokaCache {
    cache: moka::future::Cache<String, MokaValue>,
    connected: AtomicBool,
}

impl MokaCache {
    /// Create a new MokaCache with the given configuration.
    pub fn new(config: MokaCacheConfig) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(TtlExpiry)
            .build();

        MokaCache {
            cache,
            connected: AtomicBool::new(false),
        }
    }

    /// Approximate number of live entries (for monitoring/debugging).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn ensure_connected(&self) -> Result<(), CacheError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CacheError::not_connected(BACKEND))
        }
    }
}

#[async_trait]
impl Cache for MokaCache {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<(), CacheError> {
        tracing::info!("opening moka cache");
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn store(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        tracing::debug!("moka cache store: key={}, ttl={}s", key, ttl_secs);
        self.ensure_connected()?;

        self.cache
            .insert(
                key.to_string(),
                MokaValue {
                    value: value.to_string(),
                    ttl: ttl_duration(ttl_secs),
                },
            )
            .await;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<String, CacheError> {
        tracing::debug!("moka cache retrieve: key={}", key);
        self.ensure_connected()?;

        match self.cache.get(key).await {
            Some(stored) => Ok(stored.value),
            None => Err(CacheError::not_found(key)),
        }
    }

    async fn close(&self) -> Result<(), CacheError> {
        tracing::info!("closing moka cache");
        if self.connected.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(CacheError::not_connected(BACKEND))
        }
    }
}
