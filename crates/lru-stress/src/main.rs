//! LruCache stress driver - hammers one shared cache from many threads

mod workload;

use anyhow::{bail, Result};
use clap::Parser;
use lrucache::LruCache;
use std::sync::Arc;
use tracing::{error, info};

use crate::workload::Workload;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 8)]
    threads: usize,

    /// Operations per thread
    #[arg(short, long, default_value_t = 100_000)]
    ops: usize,

    /// Number of distinct keys
    #[arg(short, long, default_value_t = 4096)]
    keys: u64,

    /// Fraction of operations that are reads (0.0 - 1.0)
    #[arg(short, long, default_value_t = 0.8)]
    read_ratio: f64,

    /// RNG seed
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
}

impl Args {
    fn workload(&self) -> Result<Workload> {
        if self.threads == 0 {
            bail!("--threads must be at least 1");
        }
        if self.keys == 0 {
            bail!("--keys must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            bail!("--read-ratio must be within 0.0 and 1.0, got {}", self.read_ratio);
        }

        Ok(Workload {
            threads: self.threads,
            ops_per_thread: self.ops,
            key_space: self.keys,
            read_ratio: self.read_ratio,
            seed: self.seed,
        })
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let workload = args.workload()?;

    info!("Starting lru-stress v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);
    info!(
        "Workload: {} threads x {} ops over {} keys, read ratio {}",
        workload.threads, workload.ops_per_thread, workload.key_space, workload.read_ratio
    );

    let cache = Arc::new(LruCache::new(args.capacity)?);
    let report = workload::run(Arc::clone(&cache), &workload);

    let secs = report.elapsed.as_secs_f64();
    let ops = report.stats.total_ops();
    info!(
        "Completed {} ops in {:.3}s ({:.0} ops/sec)",
        ops,
        secs,
        if secs > 0.0 { ops as f64 / secs } else { 0.0 }
    );
    info!(
        "Reads: {} hits, {} misses (hit ratio {:.3}); writes: {} puts, {} removes",
        report.stats.hits,
        report.stats.misses,
        report.stats.hit_ratio(),
        report.stats.puts,
        report.stats.removes
    );
    info!("Final size: {} / {}", report.final_len, report.capacity);

    if report.panicked_workers > 0 {
        error!(
            "{} of {} workers panicked",
            report.panicked_workers, workload.threads
        );
    }
    if let Some(err) = &report.invariant_error {
        error!("Invariant check failed: {}", err);
    }
    if report.stats.corrupt_reads > 0 {
        error!("{} reads returned corrupt values", report.stats.corrupt_reads);
    }
    if !report.is_healthy() {
        bail!("cache failed the stress run");
    }

    info!("All invariants held");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["lru-stress"]);
        let workload = args.workload().unwrap();

        assert_eq!(args.capacity, 1024);
        assert_eq!(workload.threads, 8);
        assert_eq!(workload.read_ratio, 0.8);
    }

    #[test]
    fn test_args_rejects_bad_values() {
        let args = Args::parse_from(["lru-stress", "--threads", "0"]);
        assert!(args.workload().is_err());

        let args = Args::parse_from(["lru-stress", "--read-ratio", "1.5"]);
        assert!(args.workload().is_err());

        let args = Args::parse_from(["lru-stress", "--keys", "0"]);
        assert!(args.workload().is_err());
    }

    #[test]
    fn test_zero_capacity_is_an_error() {
        let err = LruCache::<u64, u64>::new(0).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }
}
