//! Backend selection.

use crate::backend::TempStorage;
use crate::disk::DiskStorage;
use crate::memory::MemoryStorage;
use crate::naming::DEFAULT_NAME_ATTEMPTS;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Which storage implementation a process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Keep every temp file in memory.
    #[default]
    Memory,
    /// Write temp files to the host filesystem.
    Disk,
}

/// Configuration for building the process temp storage.
///
/// Build once at startup and hand the resulting `Arc` to every collaborator;
/// there is no way to swap backends afterwards.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// The backend to build.
    pub backend: BackendKind,

    /// Root for disk temp directories (`None` = OS temp directory).
    pub temp_root: Option<PathBuf>,

    /// Names tried per temp file before reporting a collision.
    pub name_attempts: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            temp_root: None,
            name_attempts: DEFAULT_NAME_ATTEMPTS,
        }
    }
}

impl StorageConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for the in-memory backend.
    #[must_use]
    pub fn memory() -> Self {
        Self::default().backend(BackendKind::Memory)
    }

    /// Creates a configuration for the disk backend.
    #[must_use]
    pub fn disk() -> Self {
        Self::default().backend(BackendKind::Disk)
    }

    /// Sets the backend.
    #[must_use]
    pub const fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = kind;
        self
    }

    /// Sets the root directory for disk temp directories.
    #[must_use]
    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Sets the number of names tried per temp file.
    #[must_use]
    pub const fn name_attempts(mut self, attempts: u32) -> Self {
        self.name_attempts = attempts;
        self
    }

    /// Builds the configured storage.
    #[must_use]
    pub fn build(&self) -> Arc<dyn TempStorage> {
        debug!(backend = ?self.backend, "building temp storage");
        match self.backend {
            BackendKind::Memory => Arc::new(MemoryStorage::with_name_attempts(self.name_attempts)),
            BackendKind::Disk => {
                let disk = match &self.temp_root {
                    Some(root) => DiskStorage::with_root(root.clone()),
                    None => DiskStorage::new(),
                };
                Arc::new(disk.name_attempts(self.name_attempts))
            }
        }
    }
}
