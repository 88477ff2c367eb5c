//! Stress tests for temp storage.
//!
//! These helpers verify behavior under heavy load and concurrent access.

use doctemp_storage::TempStorage;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Counts from one stress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressOutcome {
    /// Operations whose data checked out.
    pub succeeded: usize,
    /// Operations that errored or read back the wrong bytes.
    pub failed: usize,
    /// Wall time spent issuing operations, excluding verification.
    pub elapsed: Duration,
}

impl StressOutcome {
    fn new(succeeded: usize, failed: usize, elapsed: Duration) -> Self {
        Self {
            succeeded,
            failed,
            elapsed,
        }
    }

    /// Operations attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// True when every attempted operation succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.succeeded > 0
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Size of each written payload in bytes.
    pub payload_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            payload_size: 256,
        }
    }
}

fn payload(seed: usize, size: usize) -> Vec<u8> {
    (0..size).map(|i| ((seed + i) % 251) as u8).collect()
}

/// Creates, fills and reads back temp files one after another.
///
/// An operation fails if the bytes read back differ from those written.
pub fn stress_sequential_round_trips(
    storage: &dyn TempStorage,
    dir: &str,
    config: &StressConfig,
) -> StressOutcome {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let data = payload(i, config.payload_size);
        let ok = storage
            .write_temp(dir, "seq", &data)
            .and_then(|name| storage.read_to_vec(&name))
            .map(|read| read == data)
            .unwrap_or(false);

        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressOutcome::new(successful, failed, start.elapsed())
}

/// Creates temp files from several threads at once.
///
/// Every thread writes a distinct payload into each file it creates; the
/// names are collected and checked for uniqueness and content afterwards.
/// Returns the outcome and the created names.
pub fn stress_concurrent_temp_files(
    storage: Arc<dyn TempStorage>,
    dir: &str,
    config: &StressConfig,
) -> (StressOutcome, Vec<String>) {
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let storage = Arc::clone(&storage);
            let failed = Arc::clone(&failed);
            let dir = dir.to_owned();
            let payload_size = config.payload_size;

            thread::spawn(move || {
                let mut created = Vec::with_capacity(ops_per_thread);
                for i in 0..ops_per_thread {
                    let seed = t * ops_per_thread + i;
                    match storage.write_temp(&dir, "worker", &payload(seed, payload_size)) {
                        Ok(name) => created.push((name, seed)),
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                created
            })
        })
        .collect();

    let mut created = Vec::new();
    for handle in handles {
        created.extend(handle.join().expect("Thread panicked"));
    }
    let duration = start.elapsed();

    // Content is checked once every thread has joined.
    let mut successful = 0usize;
    for (name, seed) in &created {
        match storage.read_to_vec(name) {
            Ok(data) if data == payload(*seed, config.payload_size) => successful += 1,
            _ => {
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    let names = created.into_iter().map(|(name, _)| name).collect();
    (
        StressOutcome::new(successful, failed.load(Ordering::Relaxed), duration),
        names,
    )
}

/// Appends to one shared temp file from several threads.
///
/// Each append is a whole `payload_size` chunk filled with the thread index,
/// so interleaving inside a chunk shows up as a failure.
pub fn stress_concurrent_appends(
    storage: Arc<dyn TempStorage>,
    dir: &str,
    config: &StressConfig,
) -> StressOutcome {
    let name = match storage.write_temp(dir, "shared", &[]) {
        Ok(name) => name,
        Err(_) => return StressOutcome::new(0, config.operations, Duration::ZERO),
    };
    let ops_per_thread = config.operations / config.threads.max(1);
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let storage = Arc::clone(&storage);
            let failed = Arc::clone(&failed);
            let name = name.clone();
            let chunk = vec![(t % 256) as u8; config.payload_size];

            thread::spawn(move || {
                let mut file = match storage.open(&name) {
                    Ok(file) => file,
                    Err(_) => {
                        failed.fetch_add(ops_per_thread, Ordering::Relaxed);
                        return;
                    }
                };
                for _ in 0..ops_per_thread {
                    if file.write_all(&chunk).is_err() {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    let duration = start.elapsed();

    let content = storage.read_to_vec(&name).unwrap_or_default();
    let successful = if config.payload_size == 0 {
        0
    } else {
        content
            .chunks(config.payload_size)
            .filter(|chunk| {
                chunk.len() == config.payload_size && chunk.iter().all(|b| *b == chunk[0])
            })
            .count()
    };

    StressOutcome::new(successful, failed.load(Ordering::Relaxed), duration)
}
