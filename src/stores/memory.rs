use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::Cache;
use crate::error::CacheError;
use crate::utils::ttl_duration;

const BACKEND: &str = "memory";

/// Internal stored value with expiration time.
#[derive(Clone)]
struct StoredValue {
    value: String,
    /// `None` never expires.
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process cache store using a HashMap behind a RwLock.
///
/// Expired entries are dropped lazily when they are read, or in bulk with
/// [`MemoryCache::purge_expired`]. Time is measured with the tokio clock so a
/// paused runtime can drive expiry in tests.
pub struct MemoryCache {
    state: RwLock<HashMap<String, StoredValue>>,
    connected: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            state: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
        }
    }

    /// Remove every expired entry and return how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let before = state.len();
        let now = Instant::now();
        state.retain(|_, v| !v.is_expired(now));
        before - state.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }

    fn ensure_connected(&self) -> Result<(), CacheError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CacheError::not_connected(BACKEND))
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<(), CacheError> {
        tracing::info!("opening memory cache");
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn store(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        tracing::debug!("memory cache store: key={}, ttl={}s", key, ttl_secs);
        self.ensure_connected()?;

        // A deadline past the clock's range is treated as no expiry.
        let expires_at = ttl_duration(ttl_secs).and_then(|ttl| Instant::now().checked_add(ttl));
        let mut state = self.state.write().await;
        state.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<String, CacheError> {
        tracing::debug!("memory cache retrieve: key={}", key);
        self.ensure_connected()?;

        let state = self.state.read().await;
        let Some(stored) = state.get(key) else {
            return Err(CacheError::not_found(key));
        };

        if stored.is_expired(Instant::now()) {
            // Entry is expired, remove it unless it was rewritten meanwhile
            drop(state);
            let mut state = self.state.write().await;
            if state
                .get(key)
                .is_some_and(|v| v.is_expired(Instant::now()))
            {
                state.remove(key);
            }
            return Err(CacheError::not_found(key));
        }

        Ok(stored.value.clone())
    }

    async fn close(&self) -> Result<(), CacheError> {
        tracing::info!("closing memory cache");
        if self.connected.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(CacheError::not_connected(BACKEND))
        }
    }
}
