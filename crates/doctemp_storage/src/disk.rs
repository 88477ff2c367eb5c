//! Disk-backed temp storage.

use crate::backend::{TempFile, TempStorage};
use crate::error::{StorageError, StorageResult};
use crate::naming::{NameGenerator, DEFAULT_NAME_ATTEMPTS};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A temp storage that passes straight through to the host filesystem.
///
/// Logical paths are host paths. Temp directories are created under a root
/// directory, which defaults to the OS temp directory. Paths handed back to
/// callers are strings, so a root that is not valid UTF-8 is rejected.
///
/// # Thread Safety
///
/// The storage holds no mutable state of its own; concurrent callers are
/// serialized by the filesystem. Temp names are claimed with `create_new`, so
/// two callers never end up sharing a file.
///
/// # Example
///
/// ```no_run
/// use doctemp_storage::{DiskStorage, TempStorage};
/// use std::io::Write;
///
/// let storage = DiskStorage::new();
/// let dir = storage.temp_dir("docgen").unwrap();
/// let mut file = storage.temp_file(&dir, "img").unwrap();
/// file.write_all(b"image bytes").unwrap();
/// storage.remove_all(&dir).unwrap();
/// ```
#[derive(Debug)]
pub struct DiskStorage {
    root: PathBuf,
    names: NameGenerator,
    name_attempts: u32,
}

impl Default for DiskStorage {
    fn default() -> Self {
        Self::with_root(std::env::temp_dir())
    }
}

impl DiskStorage {
    /// Creates a disk storage rooted at the OS temp directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a disk storage whose temp directories live under `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            names: NameGenerator::new(),
            name_attempts: DEFAULT_NAME_ATTEMPTS,
        }
    }

    /// Sets how many names `temp_file`/`temp_dir` try before giving up.
    #[must_use]
    pub fn name_attempts(mut self, attempts: u32) -> Self {
        self.name_attempts = attempts.max(1);
        self
    }

    /// Draws temp names from `names` instead of the thread-local generator.
    #[must_use]
    pub fn name_generator(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    /// Returns the directory temp directories are created in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn utf8_path(path: &Path) -> StorageResult<&str> {
    path.to_str().ok_or_else(|| {
        StorageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path is not valid UTF-8: {}", path.display()),
        ))
    })
}

impl TempStorage for DiskStorage {
    fn add(&self, source_path: &str) -> StorageResult<()> {
        // The file is already where `open` will look for it, and `open` only
        // needs read access.
        let file = File::open(source_path).map_err(|e| StorageError::source_read(source_path, e))?;
        let meta = file
            .metadata()
            .map_err(|e| StorageError::source_read(source_path, e))?;
        if !meta.is_file() {
            return Err(StorageError::source_read(
                source_path,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        Ok(())
    }

    fn open(&self, path: &str) -> StorageResult<Box<dyn TempFile>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::not_found(path),
            _ => StorageError::Io(e),
        })?;
        Ok(Box::new(DiskFile::read_only(file, path.to_owned())))
    }

    fn temp_file(&self, dir: &str, pattern: &str) -> StorageResult<Box<dyn TempFile>> {
        let dir = if dir.is_empty() { utf8_path(&self.root)? } else { dir };
        for attempt in 1..=self.name_attempts {
            let path = self.names.temp_path(dir, pattern)?;
            match OpenOptions::new()
                .read(true)
                .append(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => return Ok(Box::new(DiskFile::appendable(file, path))),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    trace!(path = %path, attempt, "temp file exists, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::NameCollision {
            attempts: self.name_attempts,
        })
    }

    fn temp_dir(&self, pattern: &str) -> StorageResult<String> {
        utf8_path(&self.root)?;
        for attempt in 1..=self.name_attempts {
            let path = self.root.join(self.names.temp_name(pattern)?);
            let name = utf8_path(&path)?.to_owned();
            match fs::create_dir(&path) {
                Ok(()) => return Ok(name),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    trace!(path = %name, attempt, "temp dir exists, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::NameCollision {
            attempts: self.name_attempts,
        })
    }

    fn remove_all(&self, dir: &str) -> StorageResult<()> {
        let meta = match fs::symlink_metadata(dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            fs::remove_dir_all(dir)?;
        } else {
            fs::remove_file(dir)?;
        }
        debug!(dir, "removed temp directory");
        Ok(())
    }
}

/// A handle on a host file.
///
/// Handles from `open` start read-only and reopen the file in append mode on
/// the first write, so read-only host files can still be opened and read.
/// Writes always land at the end. An append also moves the OS file position,
/// so reads seek back to the handle's own cursor first.
#[derive(Debug)]
pub struct DiskFile {
    file: File,
    name: String,
    offset: u64,
    appendable: bool,
}

impl DiskFile {
    fn read_only(file: File, name: String) -> Self {
        Self {
            file,
            name,
            offset: 0,
            appendable: false,
        }
    }

    fn appendable(file: File, name: String) -> Self {
        Self {
            appendable: true,
            ..Self::read_only(file, name)
        }
    }

    fn make_appendable(&mut self) -> io::Result<()> {
        if !self.appendable {
            self.file = OpenOptions::new().read(true).append(true).open(&self.name)?;
            self.appendable = true;
            trace!(name = %self.name, "reopened for append");
        }
        Ok(())
    }
}

impl Read for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(self.offset))?;
        let count = self.file.read(buf)?;
        self.offset += count as u64;
        Ok(count)
    }
}

impl Write for DiskFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.make_appendable()?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl TempFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn storage_in(dir: &tempfile::TempDir) -> DiskStorage {
        DiskStorage::with_root(dir.path())
    }

    #[test]
    fn disk_temp_file_round_trip() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let base = dir.path().to_str().unwrap();

        let mut file = storage.temp_file(base, "img").unwrap();
        file.write_all(b"hello").unwrap();
        file.write_all(b" world").unwrap();
        file.close().unwrap();

        assert!(Path::new(file.name()).exists());
        assert_eq!(storage.read_to_vec(file.name()).unwrap(), b"hello world");
    }

    #[test]
    fn disk_temp_file_empty_dir_uses_root() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);

        let file = storage.temp_file("", "x").unwrap();
        assert!(Path::new(file.name()).starts_with(dir.path()));
    }

    #[test]
    fn disk_write_appends_after_read() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let path = dir.path().join("doc.xml");
        fs::write(&path, b"abcdef").unwrap();

        let mut file = storage.open(path.to_str().unwrap()).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(file.read(&mut buf).unwrap(), 2);
        file.write_all(b"XY").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"abcdefXY");
        let mut rest = Vec::new();
        file.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"cdefXY");
    }

    #[test]
    fn disk_open_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let missing = dir.path().join("missing");

        let err = storage.open(missing.to_str().unwrap()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn disk_add_checks_source() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let path = dir.path().join("logo.png");

        assert!(matches!(
            storage.add(path.to_str().unwrap()),
            Err(StorageError::SourceRead { .. })
        ));

        fs::write(&path, b"png").unwrap();
        storage.add(path.to_str().unwrap()).unwrap();
        assert_eq!(storage.read_to_vec(path.to_str().unwrap()).unwrap(), b"png");
    }

    #[test]
    fn disk_add_rejects_directory() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        assert!(storage.add(dir.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn disk_temp_dir_is_created_under_root() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);

        let created = storage.temp_dir("docgen").unwrap();
        let created = Path::new(&created);
        assert!(created.is_dir());
        assert_eq!(created.parent().unwrap(), dir.path());
        assert!(created
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("docgen"));
    }

    #[test]
    fn disk_remove_all_is_scoped() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);

        let first = storage.temp_dir("a").unwrap();
        let second = storage.temp_dir("b").unwrap();
        storage.write_temp(&first, "x", b"1").unwrap();
        let kept = storage.write_temp(&second, "y", b"2").unwrap();

        storage.remove_all(&first).unwrap();
        assert!(!Path::new(&first).exists());
        assert_eq!(storage.read_to_vec(&kept).unwrap(), b"2");
    }

    #[test]
    fn disk_remove_all_missing_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let missing = dir.path().join("never-created");
        storage.remove_all(missing.to_str().unwrap()).unwrap();
    }

    #[test]
    fn disk_root() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        assert_eq!(storage.root(), dir.path());
    }

    #[cfg(unix)]
    #[test]
    fn disk_read_only_source_can_be_added_and_read() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let path = dir.path().join("logo.png");
        fs::write(&path, b"png bytes").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();
        let path = path.to_str().unwrap();

        storage.add(path).unwrap();
        let mut file = storage.open(path).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"png bytes");
        file.close().unwrap();
    }

    #[test]
    fn disk_open_then_write_reopens_for_append() {
        let dir = tempdir().unwrap();
        let storage = storage_in(&dir);
        let path = dir.path().join("part.xml");
        fs::write(&path, b"<a/>").unwrap();
        let path = path.to_str().unwrap();

        let mut file = storage.open(path).unwrap();
        file.write_all(b"<b/>").unwrap();
        file.write_all(b"<c/>").unwrap();
        assert_eq!(storage.read_to_vec(path).unwrap(), b"<a/><b/><c/>");
    }

    #[test]
    fn disk_temp_file_retries_taken_name() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let expected = NameGenerator::seeded(9);
        let taken = expected.temp_path(base, "img").unwrap();
        let fresh = expected.temp_path(base, "img").unwrap();
        fs::write(&taken, b"existing").unwrap();

        let storage = storage_in(&dir).name_generator(NameGenerator::seeded(9));
        let mut file = storage.temp_file(base, "img").unwrap();
        file.write_all(b"new").unwrap();

        assert_eq!(file.name(), fresh);
        assert_eq!(fs::read(&taken).unwrap(), b"existing");
        assert_eq!(fs::read(&fresh).unwrap(), b"new");
    }

    #[test]
    fn disk_temp_file_gives_up_after_attempts() {
        let dir = tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let expected = NameGenerator::seeded(9);
        for _ in 0..2 {
            fs::write(expected.temp_path(base, "img").unwrap(), b"x").unwrap();
        }

        let storage = storage_in(&dir)
            .name_attempts(2)
            .name_generator(NameGenerator::seeded(9));
        let err = storage.temp_file(base, "img").unwrap_err();
        assert!(matches!(err, StorageError::NameCollision { attempts: 2 }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn disk_temp_dir_retries_taken_name() {
        let dir = tempdir().unwrap();
        let expected = NameGenerator::seeded(4);
        let taken = dir.path().join(expected.temp_name("docgen").unwrap());
        let fresh = dir.path().join(expected.temp_name("docgen").unwrap());
        fs::create_dir(&taken).unwrap();
        fs::write(taken.join("keep.txt"), b"keep").unwrap();

        let storage = storage_in(&dir).name_generator(NameGenerator::seeded(4));
        let created = storage.temp_dir("docgen").unwrap();

        assert_eq!(Path::new(&created), fresh);
        assert!(fresh.is_dir());
        assert_eq!(fs::read(taken.join("keep.txt")).unwrap(), b"keep");
    }

    #[test]
    fn disk_temp_dir_gives_up_after_attempts() {
        let dir = tempdir().unwrap();
        let expected = NameGenerator::seeded(4);
        for _ in 0..3 {
            fs::create_dir(dir.path().join(expected.temp_name("docgen").unwrap())).unwrap();
        }

        let storage = storage_in(&dir)
            .name_attempts(3)
            .name_generator(NameGenerator::seeded(4));
        let err = storage.temp_dir("docgen").unwrap_err();
        assert!(matches!(err, StorageError::NameCollision { attempts: 3 }));
    }

    #[cfg(unix)]
    #[test]
    fn disk_non_utf8_root_is_invalid_input() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let root = dir.path().join(OsStr::from_bytes(b"bad\xff"));
        let storage = DiskStorage::with_root(&root);

        for err in [
            storage.temp_dir("docgen").unwrap_err(),
            storage.temp_file("", "img").unwrap_err(),
        ] {
            match err {
                StorageError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidInput),
                other => panic!("expected an invalid input error, got {other:?}"),
            }
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
