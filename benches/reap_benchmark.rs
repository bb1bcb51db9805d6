use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use reaper_cache::{Cache, CacheConfig, MemoryCache, Reaper, RedisCache, WaiterRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

mod common;
use common::{BenchConfig, register_waiters, store_keys, waiter_keys};

async fn setup_memory() -> Arc<dyn Cache> {
    let cache = Arc::new(MemoryCache::new());
    cache.connect().await.expect("memory connect failed");
    cache
}

async fn setup_redis(config: &CacheConfig) -> Option<Arc<dyn Cache>> {
    let cache = Arc::new(RedisCache::new(config.clone()));
    match cache.connect().await {
        Ok(()) => Some(cache),
        Err(e) => {
            eprintln!("Skipping Redis benchmarks: {}", e);
            None
        }
    }
}

/// Benchmark 1: every key still cached, so an iteration is pure probing.
fn bench_live_keys(
    c: &mut Criterion,
    rt: &Runtime,
    config: &BenchConfig,
    backends: &[(&str, Arc<dyn Cache>)],
) {
    let mut group = c.benchmark_group("reap_live_keys");
    group.sample_size(config.sample_size);

    for (name, cache) in backends {
        for &count in &config.waiter_counts {
            group.throughput(Throughput::Elements(count as u64));

            let registry = WaiterRegistry::new();
            let keys = waiter_keys(&format!("bench-live-{}", name), count);
            let _handles = rt.block_on(async {
                store_keys(cache.as_ref(), &keys, 3_600).await;
                register_waiters(&registry, &keys).await
            });
            let reaper = Reaper::new(cache.clone(), registry, Duration::from_millis(1_000));

            group.bench_with_input(BenchmarkId::new(*name, count), &count, |b, _| {
                b.to_async(rt).iter(|| reaper.reap_once());
            });
        }
    }

    group.finish();
}

/// Benchmark 2: no key is cached, so every waiter is closed and removed.
fn bench_expired_keys(
    c: &mut Criterion,
    rt: &Runtime,
    config: &BenchConfig,
    backends: &[(&str, Arc<dyn Cache>)],
) {
    let mut group = c.benchmark_group("reap_expired_keys");
    group.sample_size(config.sample_size);

    for (name, cache) in backends {
        for &count in &config.waiter_counts {
            group.throughput(Throughput::Elements(count as u64));

            let registry = WaiterRegistry::new();
            let keys = waiter_keys(&format!("bench-expired-{}", name), count);
            let reaper = Reaper::new(cache.clone(), registry.clone(), Duration::from_millis(1_000));

            group.bench_with_input(BenchmarkId::new(*name, count), &count, |b, _| {
                b.to_async(rt).iter_custom(|iters| {
                    let registry = registry.clone();
                    let keys = keys.clone();
                    let reaper = &reaper;
                    async move {
                        let mut total = Duration::ZERO;
                        for _ in 0..iters {
                            let _handles = register_waiters(&registry, &keys).await;
                            let start = Instant::now();
                            let report = reaper.reap_once().await;
                            total += start.elapsed();
                            assert_eq!(report.reaped, keys.len());
                        }
                        total
                    }
                });
            });
        }
    }

    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    let config = BenchConfig::from_env();
    let rt = Runtime::new().unwrap();

    let mut backends: Vec<(&str, Arc<dyn Cache>)> = vec![("memory", rt.block_on(setup_memory()))];
    if let Some(redis) = rt.block_on(setup_redis(&config.cache)) {
        backends.push(("redis", redis));
    }

    bench_live_keys(c, &rt, &config, &backends);
    bench_expired_keys(c, &rt, &config, &backends);
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
