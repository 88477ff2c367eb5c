//! Test fixtures and storage helpers.
//!
//! Provides convenience functions for setting up test storages on either
//! backend and common staging scenarios.

use doctemp_storage::{BackendKind, StorageConfig, TempStorage};
use std::sync::Arc;
use tempfile::TempDir;

/// A test storage with automatic cleanup.
pub struct TestStorage {
    /// The storage instance.
    pub storage: Arc<dyn TempStorage>,
    kind: BackendKind,
    /// The host directory disk temp dirs are created in (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStorage {
    /// Creates a new in-memory test storage.
    pub fn memory() -> Self {
        Self {
            storage: StorageConfig::memory().build(),
            kind: BackendKind::Memory,
            _temp_dir: None,
        }
    }

    /// Creates a new disk test storage rooted in a fresh host temp directory.
    pub fn disk() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = StorageConfig::disk().temp_root(temp_dir.path()).build();

        Self {
            storage,
            kind: BackendKind::Disk,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates a test storage for `kind`.
    pub fn of_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Memory => Self::memory(),
            BackendKind::Disk => Self::disk(),
        }
    }

    /// Returns which backend this storage uses.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Reserves a directory to create temp files in.
    ///
    /// On disk the directory exists afterwards; in memory it is just a name.
    pub fn scratch_dir(&self) -> String {
        self.storage
            .temp_dir("scratch")
            .expect("Failed to reserve scratch directory")
    }

    /// Returns a shared handle to the storage.
    pub fn shared(&self) -> Arc<dyn TempStorage> {
        Arc::clone(&self.storage)
    }
}

impl std::ops::Deref for TestStorage {
    type Target = dyn TempStorage;

    fn deref(&self) -> &Self::Target {
        self.storage.as_ref()
    }
}

/// Runs a test with a temporary in-memory storage.
///
/// # Example
///
/// ```rust,ignore
/// use doctemp_testkit::with_memory_storage;
///
/// #[test]
/// fn my_test() {
///     with_memory_storage(|storage| {
///         let name = storage.write_temp("dir", "img", b"bytes").unwrap();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_memory_storage<F, R>(f: F) -> R
where
    F: FnOnce(&dyn TempStorage) -> R,
{
    let test_storage = TestStorage::memory();
    f(&*test_storage)
}

/// Runs a test with a temporary disk storage and a scratch directory in it.
pub fn with_disk_storage<F, R>(f: F) -> R
where
    F: FnOnce(&dyn TempStorage, &str) -> R,
{
    let test_storage = TestStorage::disk();
    let dir = test_storage.scratch_dir();
    f(&*test_storage, &dir)
}

/// Runs the same test against every backend.
///
/// The closure receives the storage and a scratch directory valid for it.
pub fn for_each_backend<F>(mut f: F)
where
    F: FnMut(&TestStorage, &str),
{
    for kind in [BackendKind::Memory, BackendKind::Disk] {
        let test_storage = TestStorage::of_kind(kind);
        let dir = test_storage.scratch_dir();
        f(&test_storage, &dir);
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a storage with `count` staged images, returning their names.
    pub fn staged_images(kind: BackendKind, count: usize) -> (TestStorage, Vec<String>) {
        let test_storage = TestStorage::of_kind(kind);
        let dir = test_storage.scratch_dir();
        let mut names = Vec::with_capacity(count);

        for i in 0..count {
            let data = format!("image-{i}").into_bytes();
            let name = test_storage
                .write_temp(&dir, "image", &data)
                .expect("Failed to stage image");
            names.push(name);
        }

        (test_storage, names)
    }
}
