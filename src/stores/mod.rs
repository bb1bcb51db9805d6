//! Cache backends implementing the [`Cache`](crate::Cache) contract.

pub mod memory;
pub mod moka;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::moka::{MokaCache, MokaCacheConfig};
pub use self::redis::RedisCache;
