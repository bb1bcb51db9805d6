use reaper_cache::{Cache, WaitHandle, WaiterRegistry};

/// Keys shared by the registry and the cache in a benchmark run.
pub fn waiter_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}:query:{}", prefix, i)).collect()
}

/// Register one waiter per key. The handles must be kept alive by the caller
/// so closing them is part of the measured work.
pub async fn register_waiters(registry: &WaiterRegistry, keys: &[String]) -> Vec<WaitHandle> {
    let mut map = registry.lock().await;
    keys.iter().filter_map(|key| map.insert(key)).collect()
}

/// Store a value for every key so the reaper finds them all alive.
pub async fn store_keys(cache: &dyn Cache, keys: &[String], ttl_secs: u64) {
    for key in keys {
        cache
            .store(key, "payload", ttl_secs)
            .await
            .expect("store failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_waiters() {
        let registry = WaiterRegistry::new();
        let keys = waiter_keys("bench", 10);

        let handles = register_waiters(&registry, &keys).await;

        assert_eq!(handles.len(), 10);
        assert_eq!(registry.len().await, 10);
        assert_eq!(keys[0], "bench:query:0");
    }
}
