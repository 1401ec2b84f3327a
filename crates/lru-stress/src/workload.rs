//! Randomized multi-threaded workload against a shared LruCache

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lrucache::LruCache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, warn};

/// Share of non-read operations that are removes rather than puts
const REMOVE_SHARE: f64 = 0.1;

/// Values are derived from keys so a hit can be checked for corruption
fn value_for(key: u64) -> u64 {
    key.rotate_left(17) ^ 0x9e37_79b9_7f4a_7c15
}

/// Shape of a stress run
#[derive(Debug, Clone)]
pub struct Workload {
    pub threads: usize,
    pub ops_per_thread: usize,
    pub key_space: u64,
    pub read_ratio: f64,
    pub seed: u64,
}

/// Per-thread operation counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub removes: u64,
    pub corrupt_reads: u64,
}

impl WorkerStats {
    fn merge(&mut self, other: WorkerStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.puts += other.puts;
        self.removes += other.removes;
        self.corrupt_reads += other.corrupt_reads;
    }

    pub fn total_ops(&self) -> u64 {
        self.hits + self.misses + self.puts + self.removes
    }

    pub fn hit_ratio(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

/// Outcome of a run
#[derive(Debug)]
pub struct Report {
    pub stats: WorkerStats,
    pub elapsed: Duration,
    pub final_len: usize,
    pub capacity: usize,
    pub invariant_error: Option<String>,
    pub panicked_workers: usize,
}

impl Report {
    /// True when every worker finished, every invariant held and no read
    /// returned a foreign value
    pub fn is_healthy(&self) -> bool {
        self.panicked_workers == 0
            && self.final_len <= self.capacity
            && self.invariant_error.is_none()
            && self.stats.corrupt_reads == 0
    }
}

/// Run the workload against `cache` and check its invariants afterwards
pub fn run(cache: Arc<LruCache<u64, u64>>, workload: &Workload) -> Report {
    let start = Instant::now();

    let handles: Vec<_> = (0..workload.threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let workload = workload.clone();
            thread::spawn(move || worker(&cache, &workload, t as u64))
        })
        .collect();

    let mut stats = WorkerStats::default();
    let mut panicked_workers = 0;
    for (t, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(worker_stats) => {
                debug!(thread = t, ?worker_stats, "worker finished");
                stats.merge(worker_stats);
            }
            Err(_) => {
                error!(thread = t, "worker panicked");
                panicked_workers += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    let invariant_error = cache.check_invariants().err().map(|e| e.to_string());

    Report {
        stats,
        elapsed,
        final_len: cache.len(),
        capacity: cache.capacity(),
        invariant_error,
        panicked_workers,
    }
}

fn worker(cache: &LruCache<u64, u64>, workload: &Workload, thread_id: u64) -> WorkerStats {
    let mut rng = StdRng::seed_from_u64(workload.seed.wrapping_add(thread_id));
    let mut stats = WorkerStats::default();

    for _ in 0..workload.ops_per_thread {
        let key = rng.gen_range(0..workload.key_space);

        if rng.gen_bool(workload.read_ratio) {
            match cache.get(&key) {
                Some(value) if value == value_for(key) => stats.hits += 1,
                Some(value) => {
                    warn!(key, value, "read returned a value that was never stored for this key");
                    stats.corrupt_reads += 1;
                }
                None => stats.misses += 1,
            }
        } else if rng.gen_bool(REMOVE_SHARE) {
            cache.remove(&key);
            stats.removes += 1;
        } else {
            cache.put(key, value_for(key));
            stats.puts += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(threads: usize, read_ratio: f64) -> Workload {
        Workload {
            threads,
            ops_per_thread: 2_000,
            key_space: 128,
            read_ratio,
            seed: 42,
        }
    }

    #[test]
    fn test_run_is_healthy() {
        let cache = Arc::new(LruCache::new(32).unwrap());
        let report = run(cache, &workload(4, 0.7));

        assert!(report.is_healthy(), "{:?}", report);
        assert_eq!(report.stats.total_ops(), 4 * 2_000);
        assert!(report.final_len <= 32);
    }

    #[test]
    fn test_write_only_run() {
        let cache = Arc::new(LruCache::new(16).unwrap());
        let report = run(Arc::clone(&cache), &workload(2, 0.0));

        assert_eq!(report.stats.hits + report.stats.misses, 0);
        assert!(report.stats.puts > 0);
        assert!(report.is_healthy());
        assert_eq!(report.final_len, cache.len());
    }

    #[test]
    fn test_single_thread_is_deterministic() {
        let first = run(Arc::new(LruCache::new(8).unwrap()), &workload(1, 0.5));
        let second = run(Arc::new(LruCache::new(8).unwrap()), &workload(1, 0.5));

        assert_eq!(first.stats, second.stats);
        assert_eq!(first.final_len, second.final_len);
    }

    #[test]
    fn test_panicked_workers_make_run_unhealthy() {
        // gen_bool rejects probabilities above 1.0, so every worker panics
        let cache = Arc::new(LruCache::new(8).unwrap());
        let report = run(cache, &workload(2, 2.0));

        assert_eq!(report.panicked_workers, 2);
        assert_eq!(report.stats.total_ops(), 0);
        assert!(report.invariant_error.is_none());
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_hit_ratio() {
        let stats = WorkerStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_ratio(), 0.75);
        assert_eq!(WorkerStats::default().hit_ratio(), 0.0);
    }
}
