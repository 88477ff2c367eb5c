//! Staging harness for integration tests.
//!
//! Mirrors what a document assembler does with temp storage: stage files,
//! append to them, read them back, and clear the area at the end.

use doctemp_storage::{StorageError, TempStorage};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// A test harness that tracks what every staged file should contain.
pub struct StagingHarness {
    /// The storage under test.
    pub storage: Arc<dyn TempStorage>,
    dir: String,
    files: HashMap<String, Vec<u8>>,
}

impl StagingHarness {
    /// Creates a harness over `storage`, staging into a fresh temp directory.
    pub fn new(storage: Arc<dyn TempStorage>) -> Self {
        let dir = storage
            .temp_dir("staging")
            .expect("Failed to reserve staging directory");
        Self {
            storage,
            dir,
            files: HashMap::new(),
        }
    }

    /// Returns the staging directory.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Stages `data` as a new temp file and tracks it.
    pub fn stage(&mut self, pattern: &str, data: &[u8]) -> String {
        let name = self
            .storage
            .write_temp(&self.dir, pattern, data)
            .expect("Failed to stage file");
        self.files.insert(name.clone(), data.to_vec());
        name
    }

    /// Appends `data` to a staged file through a fresh handle.
    pub fn append(&mut self, name: &str, data: &[u8]) {
        let mut file = self.storage.open(name).expect("Failed to open staged file");
        file.write_all(data).expect("Failed to append");
        file.close().expect("Failed to close");
        self.files
            .entry(name.to_owned())
            .or_default()
            .extend_from_slice(data);
    }

    /// Reads a staged file and verifies it matches the tracked content.
    pub fn read_and_verify(&self, name: &str) -> Vec<u8> {
        let actual = self.storage.read_to_vec(name).expect("Failed to read staged file");

        if let Some(expected) = self.files.get(name) {
            assert_eq!(&actual, expected, "Content mismatch for {name}");
        }

        actual
    }

    /// Verifies every tracked file.
    pub fn verify_all(&self) {
        for name in self.files.keys() {
            self.read_and_verify(name);
        }
    }

    /// Returns the number of tracked files.
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Clears the staging directory and forgets every tracked file.
    pub fn clear(&mut self) {
        self.storage
            .remove_all(&self.dir)
            .expect("Failed to clear staging directory");
        for name in self.files.keys() {
            assert!(
                matches!(self.storage.open(name), Err(StorageError::NotFound { .. })),
                "{name} survived remove_all"
            );
        }
        self.files.clear();
    }
}
