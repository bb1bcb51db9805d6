use reaper_cache::CacheConfig;

const DEFAULT_SAMPLE_SIZE: usize = 50;
const DEFAULT_WAITER_COUNTS: [usize; 3] = [10, 100, 1_000];

/// Benchmark knobs.
///
/// The Redis backend is located through the regular `REAPER_CACHE_*`
/// variables, so benchmarks hit the same server the adapter would.
/// `REAPER_BENCH_SAMPLE_SIZE` and `REAPER_BENCH_WAITERS` (comma separated)
/// shape the workload.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub cache: CacheConfig,
    pub sample_size: usize,
    pub waiter_counts: Vec<usize>,
}

impl BenchConfig {
    pub fn from_env() -> Self {
        let cache = CacheConfig::from_env().unwrap_or_else(|e| {
            eprintln!("Ignoring cache environment: {}", e);
            CacheConfig::default()
        });

        let sample_size = std::env::var("REAPER_BENCH_SAMPLE_SIZE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n| n >= 10)
            .unwrap_or(DEFAULT_SAMPLE_SIZE);

        let waiter_counts = std::env::var("REAPER_BENCH_WAITERS")
            .ok()
            .map(|s| parse_counts(&s))
            .filter(|counts| !counts.is_empty())
            .unwrap_or_else(|| DEFAULT_WAITER_COUNTS.to_vec());

        eprintln!(
            "reap benchmarks: redis={} samples={} waiters={:?}",
            cache.connection_url(),
            sample_size,
            waiter_counts
        );

        BenchConfig {
            cache,
            sample_size,
            waiter_counts,
        }
    }
}

fn parse_counts(s: &str) -> Vec<usize> {
    s.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .filter(|&n| n > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counts_skips_invalid_entries() {
        assert_eq!(parse_counts("10, 0, abc,250"), vec![10, 250]);
        assert!(parse_counts("").is_empty());
    }
}
