//! reaper-cache - A TTL-backed cache adapter with a background reaper
//!
//! This library provides:
//! - A backend-agnostic `Cache` contract (`connect`, `store`, `retrieve`, `close`)
//! - A Redis adapter relying on Redis' native key expiration
//! - In-process Memory and Moka backends behind the same contract
//! - A registry of in-flight waiter channels keyed by cache key
//! - A cancellable reaper releasing waiters whose key has expired
//!
//! # Example
//!
//! ```ignore
//! use reaper_cache::{Cache, CacheConfig, Reaper, RedisCache, WaiterRegistry};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reaper_cache::CacheError> {
//!     let config = CacheConfig::from_env()?;
//!     let cache = Arc::new(RedisCache::new(config.clone()));
//!     cache.connect().await?;
//!
//!     // The registry is shared with the layer that coordinates fetches.
//!     let registry = WaiterRegistry::new();
//!     let token = CancellationToken::new();
//!     Reaper::from_config(cache.clone(), registry.clone(), &config).spawn(token.clone());
//!
//!     let registration = registry.join("q1").await;
//!     if registration.is_leader {
//!         cache.store("q1", "payload", 60).await?;
//!         registry.complete("q1").await;
//!     } else {
//!         let mut handle = registration.handle;
//!         handle.closed().await;
//!     }
//!
//!     token.cancel();
//!     cache.close().await
//! }
//! ```

mod cache;
mod config;
mod error;
mod reaper;
mod registry;
pub mod stores;
mod utils;

// Re-export public API
pub use cache::Cache;
pub use config::{CacheConfig, Protocol};
pub use error::CacheError;
pub use reaper::{ReapReport, Reaper};
pub use registry::{Registration, WaitHandle, Waiter, WaiterId, WaiterMap, WaiterRegistry};
pub use stores::memory::MemoryCache;
pub use stores::moka::{MokaCache, MokaCacheConfig};
pub use stores::redis::RedisCache;
