//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use doctemp_storage::{StorageConfig, TempStorage};
use rand::Rng;
use std::sync::Arc;
use tempfile::TempDir;

/// Generate random file content of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// A memory storage.
pub fn memory_storage() -> Arc<dyn TempStorage> {
    StorageConfig::memory().build()
}

/// A disk storage rooted in a fresh host directory, plus a scratch
/// directory inside it. Keep the `TempDir` alive for the whole benchmark.
pub fn disk_storage() -> (Arc<dyn TempStorage>, String, TempDir) {
    let root = TempDir::new().expect("Failed to create temp directory");
    let storage = StorageConfig::disk().temp_root(root.path()).build();
    let dir = storage.temp_dir("bench").expect("Failed to create bench directory");
    (storage, dir, root)
}
