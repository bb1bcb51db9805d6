//! Configuration consumed by the cache adapters and the reaper.
//!
//! The configuration is owned by the embedding application: it can be
//! deserialized as part of a larger config file or read from the environment.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CacheError;

/// Network transport used to reach the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// `host:port` over TCP.
    #[default]
    Tcp,
    /// Path to a unix-domain socket.
    Unix,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Unix => write!(f, "unix"),
        }
    }
}

impl FromStr for Protocol {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "unix" => Ok(Protocol::Unix),
            other => Err(CacheError::Config(format!(
                "unknown protocol '{}', expected 'tcp' or 'unix'",
                other
            ))),
        }
    }
}

/// Configuration for the cache adapter and its reaper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Transport kind.
    ///
    /// Default: `tcp`
    pub protocol: Protocol,

    /// Endpoint address.
    ///
    /// For `tcp` this is `host:port` (a full `redis://` or `rediss://` URL is
    /// also accepted). For `unix` it is the socket path.
    ///
    /// Default: `localhost:6379`
    pub endpoint: String,

    /// Milliseconds the reaper sleeps between iterations.
    ///
    /// Default: `1000`
    pub reap_sleep_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            protocol: Protocol::Tcp,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            reap_sleep_ms: Self::DEFAULT_REAP_SLEEP_MS,
        }
    }
}

impl CacheConfig {
    const DEFAULT_ENDPOINT: &str = "localhost:6379";
    const DEFAULT_REAP_SLEEP_MS: u64 = 1000;

    /// Load the configuration from environment variables.
    ///
    /// - `REAPER_CACHE_PROTOCOL` (`tcp` or `unix`)
    /// - `REAPER_CACHE_ENDPOINT`
    /// - `REAPER_CACHE_REAP_SLEEP_MS`
    ///
    /// Unset variables fall back to the defaults; set but invalid values are
    /// reported as `CacheError::Config`.
    pub fn from_env() -> Result<Self, CacheError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CacheError> {
        let mut config = Self::default();

        if let Some(protocol) = lookup("REAPER_CACHE_PROTOCOL") {
            config.protocol = protocol.parse()?;
        }
        if let Some(endpoint) = lookup("REAPER_CACHE_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(sleep) = lookup("REAPER_CACHE_REAP_SLEEP_MS") {
            config.reap_sleep_ms = sleep.trim().parse().map_err(|e| {
                CacheError::Config(format!("invalid REAPER_CACHE_REAP_SLEEP_MS '{}': {}", sleep, e))
            })?;
        }

        Ok(config)
    }

    /// Sleep between reaper iterations.
    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_sleep_ms)
    }

    /// Connection URL understood by the redis client.
    ///
    /// # Examples
    /// - `tcp` + `localhost:6379` -> `redis://localhost:6379`
    /// - `unix` + `/var/run/redis.sock` -> `redis+unix:///var/run/redis.sock`
    pub fn connection_url(&self) -> String {
        match self.protocol {
            Protocol::Tcp => {
                if self.endpoint.starts_with("redis://") || self.endpoint.starts_with("rediss://")
                {
                    self.endpoint.clone()
                } else {
                    format!("redis://{}", self.endpoint)
                }
            }
            Protocol::Unix => {
                let path = self
                    .endpoint
                    .trim_start_matches("redis+unix://")
                    .trim_start_matches("unix://");
                format!("redis+unix://{}", path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.protocol, Protocol::Tcp);
        assert_eq!(config.endpoint, "localhost:6379");
        assert_eq!(config.reap_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("REAPER_CACHE_PROTOCOL", "UNIX"),
            ("REAPER_CACHE_ENDPOINT", "/tmp/redis.sock"),
            ("REAPER_CACHE_REAP_SLEEP_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.protocol, Protocol::Unix);
        assert_eq!(config.endpoint, "/tmp/redis.sock");
        assert_eq!(config.reap_sleep_ms, 250);
    }

    #[test]
    fn test_from_lookup_rejects_invalid_values() {
        let err = CacheConfig::from_lookup(lookup_from(&[("REAPER_CACHE_PROTOCOL", "udp")]))
            .unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));

        let err =
            CacheConfig::from_lookup(lookup_from(&[("REAPER_CACHE_REAP_SLEEP_MS", "soon")]))
                .unwrap_err();
        assert!(matches!(err, CacheError::Config(_)));
    }

    #[test]
    fn test_connection_url() {
        let tcp = CacheConfig::default();
        assert_eq!(tcp.connection_url(), "redis://localhost:6379");

        let url = CacheConfig {
            endpoint: "rediss://cache.internal:6380".to_string(),
            ..CacheConfig::default()
        };
        assert_eq!(url.connection_url(), "rediss://cache.internal:6380");

        let unix = CacheConfig {
            protocol: Protocol::Unix,
            endpoint: "/var/run/redis.sock".to_string(),
            ..CacheConfig::default()
        };
        assert_eq!(unix.connection_url(), "redis+unix:///var/run/redis.sock");
    }
}
