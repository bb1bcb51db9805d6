/// Error type for cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The backing store could not be reached or did not answer the health probe.
    #[error("[{backend}] connection to '{endpoint}' failed: {message}")]
    Connection {
        backend: String,
        endpoint: String,
        message: String,
    },
    /// A transport or server fault during an operation.
    #[error("[{backend}] backend error for key '{key}': {message}")]
    Backend {
        backend: String,
        key: String,
        message: String,
    },
    /// The key is absent or has expired.
    #[error("key '{key}' not found")]
    NotFound { key: String },
    /// The adapter was used before `connect` or after `close`.
    #[error("[{backend}] not connected")]
    NotConnected { backend: String },
    /// A configuration value could not be interpreted.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Create a new connection error.
    pub fn connection(
        backend: impl Into<String>,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Connection {
            backend: backend.into(),
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new backend error.
    pub fn backend(
        backend: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Backend {
            backend: backend.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new miss.
    pub fn not_found(key: impl Into<String>) -> Self {
        CacheError::NotFound { key: key.into() }
    }

    pub fn not_connected(backend: impl Into<String>) -> Self {
        CacheError::NotConnected {
            backend: backend.into(),
        }
    }

    /// True for a cache miss, false for every infrastructure failure.
    ///
    /// Callers use this to decide between recomputing a value and
    /// reporting that the backend is unavailable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}
