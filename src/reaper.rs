//! Background reconciliation between the waiter registry and the cache.
//!
//! Each iteration snapshots the registry under its lock, probes the cache for
//! every snapshotted key with the lock released, and closes the waiters whose
//! keys are gone. Keys are probed one after another, so an iteration costs one
//! round trip per registered waiter.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::registry::WaiterRegistry;

/// Outcome of a single reaper iteration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapReport {
    /// Keys in the snapshot.
    pub probed: usize,
    /// Waiters closed because their key was gone.
    pub reaped: usize,
    /// Keys found missing whose waiter had been replaced or removed before
    /// reconciliation.
    pub superseded: usize,
    /// Probes that failed with something other than a miss.
    pub failed: usize,
}

/// Releases waiters whose backing cache key has expired.
pub struct Reaper {
    cache: Arc<dyn Cache>,
    registry: WaiterRegistry,
    interval: Duration,
}

impl Reaper {
    /// Create a reaper sharing `registry` (and its lock) with the caller.
    ///
    /// # Arguments
    /// * `cache` - Backend probed for key existence
    /// * `registry` - The registry the coordination layer registers waiters in
    /// * `interval` - Sleep between iterations
    pub fn new(cache: Arc<dyn Cache>, registry: WaiterRegistry, interval: Duration) -> Self {
        Reaper {
            cache,
            registry,
            interval,
        }
    }

    /// Create a reaper sleeping `config.reap_sleep_ms` between iterations.
    pub fn from_config(
        cache: Arc<dyn Cache>,
        registry: WaiterRegistry,
        config: &CacheConfig,
    ) -> Self {
        Self::new(cache, registry, config.reap_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one snapshot / probe / reconcile pass.
    pub async fn reap_once(&self) -> ReapReport {
        let snapshot = self.registry.lock().await.snapshot();

        let mut report = ReapReport {
            probed: snapshot.len(),
            ..ReapReport::default()
        };

        for (key, id) in snapshot {
            match self.cache.exists(&key).await {
                Ok(true) => {}
                Ok(false) => {
                    let mut map = self.registry.lock().await;
                    // The waiter may have been replaced since the snapshot.
                    match map.remove_if_current(&key, id) {
                        Some(waiter) => {
                            tracing::debug!("{} cache reap: key={}", self.cache.name(), key);
                            waiter.close();
                            report.reaped += 1;
                        }
                        None => report.superseded += 1,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "{} cache reap probe failed, retrying next iteration: key={}, error={}",
                        self.cache.name(),
                        key,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Reap until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        tracing::info!(
            "starting {} cache reaper: interval={}ms",
            self.cache.name(),
            self.interval.as_millis()
        );

        loop {
            let report = tokio::select! {
                _ = token.cancelled() => break,
                report = self.reap_once() => report,
            };

            if report.reaped > 0 || report.failed > 0 {
                tracing::debug!(
                    "{} cache reap finished: probed={}, reaped={}, superseded={}, failed={}",
                    self.cache.name(),
                    report.probed,
                    report.reaped,
                    report.superseded,
                    report.failed
                );
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("{} cache reaper stopped", self.cache.name());
    }

    /// Run the reaper as a background task.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }
}
