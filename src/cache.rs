use async_trait::async_trait;

use crate::error::CacheError;

/// The cache contract shared by every backend.
///
/// Values are opaque strings; serializing payloads and deriving keys is the
/// caller's job. Expiration is delegated to the backend: a value stored with a
/// `ttl` of N seconds is a miss once N seconds have passed.
///
/// Implementations must be safe to share between tasks. The reaper only
/// ever talks to a backend through this trait.
#[async_trait]
pub trait Cache: Send + Sync {
    /// A name for errors and tracing.
    ///
    /// # Example
    /// - "redis"
    /// - "memory"
    /// - "moka"
    fn name(&self) -> &'static str;

    /// Open the connection and verify it with a health probe.
    ///
    /// Must be called before any other operation.
    async fn connect(&self) -> Result<(), CacheError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// A `ttl_secs` of `0` stores the value without expiration.
    async fn store(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    /// Read the value for `key`.
    ///
    /// Absent and expired keys are reported as `CacheError::NotFound`.
    async fn retrieve(&self, key: &str) -> Result<String, CacheError>;

    /// Existence probe used by the reaper.
    ///
    /// Only a definitive miss yields `Ok(false)`; every other failure is
    /// propagated so the caller can tell "gone" from "unknown".
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        match self.retrieve(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Release the connection.
    async fn close(&self) -> Result<(), CacheError>;
}
