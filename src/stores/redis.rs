use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::CacheError;

const BACKEND: &str = "redis";

/// Redis-backed cache.
///
/// Values are written with `SET key value EX ttl` so Redis expires them on its
/// own; a miss is reported when `GET` returns nil.
///
/// The multiplexed connection is cloned for every call, so one `RedisCache`
/// can be shared by any number of tasks without extra locking.
pub struct RedisCache {
    config: CacheConfig,
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisCache {
    /// Create an unconnected RedisCache. Call [`Cache::connect`] before use.
    ///
    /// # Example
    /// ```ignore
    /// let cache = RedisCache::new(CacheConfig {
    ///     protocol: Protocol::Tcp,
    ///     endpoint: "localhost:6379".to_string(),
    ///     reap_sleep_ms: 1000,
    /// });
    /// cache.connect().await?;
    /// ```
    pub fn new(config: CacheConfig) -> Self {
        RedisCache {
            config,
            connection: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| CacheError::not_connected(BACKEND))
    }
}

#[async_trait]
impl Cache for RedisCache {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<(), CacheError> {
        let endpoint = self.config.endpoint.as_str();
        tracing::info!(
            "connecting to redis: protocol={}, endpoint={}",
            self.config.protocol,
            endpoint
        );

        let client = redis::Client::open(self.config.connection_url().as_str()).map_err(|e| {
            CacheError::connection(
                BACKEND,
                endpoint,
                format!("Failed to create Redis client: {}", e),
            )
        })?;

        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                CacheError::connection(
                    BACKEND,
                    endpoint,
                    format!("Failed to connect to Redis: {}", e),
                )
            })?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| CacheError::connection(BACKEND, endpoint, format!("PING failed: {}", e)))?;

        if pong != "PONG" {
            return Err(CacheError::connection(
                BACKEND,
                endpoint,
                format!("unexpected PING reply: {}", pong),
            ));
        }

        *self.connection.write().await = Some(connection);
        Ok(())
    }

    async fn store(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        tracing::debug!("redis cache store: key={}, ttl={}s", key, ttl_secs);
        let mut conn = self.connection().await?;

        if ttl_secs == 0 {
            let _: () = conn
                .set(key, value)
                .await
                .map_err(|e| CacheError::backend(BACKEND, key, format!("SET failed: {}", e)))?;
        } else {
            let _: () = conn
                .set_ex(key, value, ttl_secs)
                .await
                .map_err(|e| CacheError::backend(BACKEND, key, format!("SETEX failed: {}", e)))?;
        }

        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<String, CacheError> {
        tracing::debug!("redis cache retrieve: key={}", key);
        let mut conn = self.connection().await?;

        let result: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::backend(BACKEND, key, format!("GET failed: {}", e)))?;

        result.ok_or_else(|| CacheError::not_found(key))
    }

    async fn close(&self) -> Result<(), CacheError> {
        tracing::info!("closing redis connection");
        match self.connection.write().await.take() {
            Some(_) => Ok(()),
            None => Err(CacheError::not_connected(BACKEND)),
        }
    }
}
