//! In-memory temp storage.

use crate::backend::{TempFile, TempStorage};
use crate::error::{StorageError, StorageResult};
use crate::naming::{self, NameGenerator, DEFAULT_NAME_ATTEMPTS};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::sync::Arc;
use tracing::{debug, trace};

/// Content of one logical file.
///
/// The byte buffer only ever grows; its length is the file size.
#[derive(Debug)]
struct DataCell {
    name: String,
    content: RwLock<Vec<u8>>,
}

impl DataCell {
    fn new(name: String, content: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            name,
            content: RwLock::new(content),
        })
    }

    fn size(&self) -> u64 {
        self.content.read().len() as u64
    }
}

/// A temp storage that keeps every file in memory.
///
/// Files are keyed by their full logical path. Handles share the stored
/// content, so bytes written through one handle are visible to every other
/// handle on the same path as soon as the write returns.
///
/// # Thread Safety
///
/// The store is guarded by a single `RwLock`; every lifecycle operation is
/// atomic with respect to the others. A handle's cursor is local to the
/// handle and needs `&mut` access.
///
/// # Example
///
/// ```rust
/// use doctemp_storage::{MemoryStorage, TempStorage};
/// use std::io::{Read, Write};
///
/// let storage = MemoryStorage::new();
/// let mut file = storage.temp_file("word/media", "img").unwrap();
/// file.write_all(b"\x89PNG").unwrap();
///
/// let mut reopened = storage.open(file.name()).unwrap();
/// let mut buf = Vec::new();
/// reopened.read_to_end(&mut buf).unwrap();
/// assert_eq!(buf, b"\x89PNG");
/// ```
#[derive(Debug)]
pub struct MemoryStorage {
    cells: RwLock<HashMap<String, Arc<DataCell>>>,
    names: NameGenerator,
    name_attempts: u32,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_name_attempts(DEFAULT_NAME_ATTEMPTS)
    }
}

impl MemoryStorage {
    /// Creates an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage that tries at most `attempts` names per
    /// `temp_file` call. Zero is treated as one.
    #[must_use]
    pub fn with_name_attempts(attempts: u32) -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
            names: NameGenerator::new(),
            name_attempts: attempts.max(1),
        }
    }

    /// Draws temp names from `names` instead of the thread-local generator.
    #[must_use]
    pub fn with_name_generator(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    /// Registers `data` under `name`, replacing any previous entry.
    pub fn add_bytes(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = name.into();
        let cell = DataCell::new(name.clone(), data.into());
        self.cells.write().insert(name, cell);
    }

    /// Returns the number of stored files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Returns true if a file is registered under `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.cells.read().contains_key(path)
    }

    /// Returns the size in bytes of the file under `path`.
    #[must_use]
    pub fn size_of(&self, path: &str) -> Option<u64> {
        self.cells.read().get(path).map(|cell| cell.size())
    }

    /// Returns every registered path, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cells.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl TempStorage for MemoryStorage {
    fn add(&self, source_path: &str) -> StorageResult<()> {
        // Host read happens outside the store lock.
        let data = fs::read(source_path).map_err(|e| StorageError::source_read(source_path, e))?;
        trace!(path = source_path, size = data.len(), "added host file");
        self.add_bytes(source_path, data);
        Ok(())
    }

    fn open(&self, path: &str) -> StorageResult<Box<dyn TempFile>> {
        let cell = self
            .cells
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))?;
        Ok(Box::new(MemFile::new(cell)))
    }

    fn temp_file(&self, dir: &str, pattern: &str) -> StorageResult<Box<dyn TempFile>> {
        for attempt in 1..=self.name_attempts {
            let name = self.names.temp_path(dir, pattern)?;
            match self.cells.write().entry(name) {
                Entry::Vacant(slot) => {
                    let cell = DataCell::new(slot.key().clone(), Vec::new());
                    slot.insert(Arc::clone(&cell));
                    return Ok(Box::new(MemFile::new(cell)));
                }
                Entry::Occupied(slot) => {
                    trace!(name = %slot.key(), attempt, "temp name taken, retrying");
                }
            }
        }
        Err(StorageError::NameCollision {
            attempts: self.name_attempts,
        })
    }

    fn temp_dir(&self, pattern: &str) -> StorageResult<String> {
        self.names.temp_name(pattern)
    }

    fn remove_all(&self, dir: &str) -> StorageResult<()> {
        // Clears the whole store, not just entries under `dir`.
        let mut cells = self.cells.write();
        let cleared = cells.len();
        cells.clear();
        debug!(dir, cleared, "cleared in-memory temp storage");
        Ok(())
    }
}

/// A handle on one in-memory file.
#[derive(Debug)]
pub struct MemFile {
    cell: Arc<DataCell>,
    offset: usize,
}

impl MemFile {
    fn new(cell: Arc<DataCell>) -> Self {
        Self { cell, offset: 0 }
    }

    /// Returns the current read position.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset as u64
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let content = self.cell.content.read();
        let size = content.len();
        if self.offset >= size {
            return Ok(0);
        }

        let end = size.min(self.offset.saturating_add(buf.len()));
        let count = end - self.offset;
        buf[..count].copy_from_slice(&content[self.offset..end]);
        self.offset = end;
        Ok(count)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !buf.is_empty() {
            self.cell.content.write().extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TempFile for MemFile {
    fn name(&self) -> &str {
        &self.cell.name
    }

    fn close(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
