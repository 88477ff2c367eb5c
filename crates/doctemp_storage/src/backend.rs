//! Storage backend trait definitions.

use crate::error::StorageResult;
use std::fmt;
use std::io::{Read, Write};

/// An open temp file.
///
/// Reads are sequential from a per-handle cursor; writes always append to the
/// end of the file regardless of where the cursor is. End of stream is the
/// usual `Ok(0)` from [`Read::read`].
pub trait TempFile: Read + Write + Send + fmt::Debug {
    /// Returns the path the file is registered under.
    fn name(&self) -> &str;

    /// Closes the handle.
    ///
    /// The file itself stays in its storage; only the cursor is released.
    ///
    /// # Errors
    ///
    /// Returns an error if a disk-backed handle fails to flush.
    fn close(&mut self) -> StorageResult<()>;
}

/// A temporary storage area used while a document is being assembled.
///
/// A process picks one implementation at startup (see
/// [`crate::StorageConfig`]) and routes every temp file through it, so the
/// assembler behaves the same whether artifacts live in memory or on disk.
///
/// # Invariants
///
/// - Bytes written through a handle are returned unchanged by a later `open`
/// - Every operation is safe to call concurrently from several threads
/// - Names returned by `temp_file`/`temp_dir` embed a fresh random token
///
/// # Implementors
///
/// - [`super::MemoryStorage`] - Everything resident in memory
/// - [`super::DiskStorage`] - Pass-through to the host filesystem
pub trait TempStorage: Send + Sync + fmt::Debug {
    /// Registers the host file at `source_path` under the same path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::SourceRead`] if the host file cannot be
    /// read. Nothing is registered in that case.
    fn add(&self, source_path: &str) -> StorageResult<()>;

    /// Opens the file registered under `path` with its cursor at the start.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if nothing is registered
    /// under `path`.
    fn open(&self, path: &str) -> StorageResult<Box<dyn TempFile>>;

    /// Creates an empty file named `dir/pattern<token>` and opens it.
    ///
    /// # Errors
    ///
    /// Returns an error if no unique name could be generated.
    fn temp_file(&self, dir: &str, pattern: &str) -> StorageResult<Box<dyn TempFile>>;

    /// Returns a fresh directory name `pattern<token>`.
    ///
    /// # Errors
    ///
    /// Returns an error if no name could be generated.
    fn temp_dir(&self, pattern: &str) -> StorageResult<String>;

    /// Clears temp files.
    ///
    /// How much is cleared is backend-specific: the in-memory backend drops
    /// every entry and ignores `dir`, the disk backend removes `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a disk-backed removal fails.
    fn remove_all(&self, dir: &str) -> StorageResult<()>;

    /// Reads the whole file registered under `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    fn read_to_vec(&self, path: &str) -> StorageResult<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        file.close()?;
        Ok(buf)
    }

    /// Creates a temp file holding `data` and returns its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write_temp(&self, dir: &str, pattern: &str, data: &[u8]) -> StorageResult<String> {
        let mut file = self.temp_file(dir, pattern)?;
        file.write_all(data)?;
        file.close()?;
        Ok(file.name().to_owned())
    }
}
