//! Purpose: Backing store file creation/opening, whole-file line I/O, and exclusive locking.
//! Exports: `BackingStore`, `StoreLock`.
//! Role: The only code that touches a database file's bytes.
//! Invariants: All reads and rewrites happen through a held `StoreLock`.
//! Invariants: Every persisted line is followed by `LINE_TERMINATOR`.
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use libc::{EACCES, EPERM};

use crate::core::error::{Error, ErrorKind};
use crate::core::format::LINE_TERMINATOR;

#[derive(Clone, Debug)]
pub struct BackingStore {
    path: PathBuf,
}

impl BackingStore {
    /// Creates a new, empty store file. Fails with `AlreadyExists` if the path is taken.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| {
                Error::io(err, &path).with_message("failed to create backing store")
            })?;
        Ok(Self { path })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let meta = std::fs::metadata(&path)
            .map_err(|err| Error::io(err, &path).with_message("failed to open backing store"))?;
        if !meta.is_file() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("backing store is not a regular file")
                .with_path(&path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file and blocks until an exclusive lock is held.
    pub fn lock(&self) -> Result<StoreLock<'_>, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|err| Error::io(err, &self.path))?;
        file.lock_exclusive().map_err(|err| {
            Error::new(lock_error_kind(&err))
                .with_message("failed to lock backing store")
                .with_path(&self.path)
                .with_source(err)
        })?;
        Ok(StoreLock {
            file,
            path: &self.path,
        })
    }
}

/// Exclusive hold on a store file; all line I/O goes through it.
pub struct StoreLock<'a> {
    file: File,
    path: &'a Path,
}

impl StoreLock<'_> {
    pub fn read_lines(&mut self) -> Result<Vec<String>, Error> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|err| Error::io(err, self.path))?;
        let mut text = String::new();
        self.file.read_to_string(&mut text).map_err(|err| {
            if err.kind() == io::ErrorKind::InvalidData {
                Error::new(ErrorKind::Corrupt)
                    .with_message("backing store is not valid UTF-8")
                    .with_path(self.path)
                    .with_source(err)
            } else {
                Error::io(err, self.path)
            }
        })?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    /// Replaces the whole file with `lines`, each followed by the line terminator.
    pub fn rewrite(&mut self, lines: &[String]) -> Result<(), Error> {
        let mut text = String::with_capacity(
            lines.iter().map(|line| line.len() + LINE_TERMINATOR.len()).sum(),
        );
        for line in lines {
            text.push_str(line);
            text.push_str(LINE_TERMINATOR);
        }
        self.file
            .set_len(0)
            .map_err(|err| Error::io(err, self.path))?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|err| Error::io(err, self.path))?;
        self.file
            .write_all(text.as_bytes())
            .map_err(|err| Error::io(err, self.path))?;
        self.file.flush().map_err(|err| Error::io(err, self.path))
    }

    pub fn append(&mut self, text: &str) -> Result<(), Error> {
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|err| Error::io(err, self.path))?;
        self.file
            .write_all(text.as_bytes())
            .map_err(|err| Error::io(err, self.path))?;
        self.file.flush().map_err(|err| Error::io(err, self.path))
    }
}

impl Drop for StoreLock<'_> {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn lock_error_kind(err: &io::Error) -> ErrorKind {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM {
        return ErrorKind::Permission;
    }
    match err.kind() {
        io::ErrorKind::WouldBlock => ErrorKind::Busy,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::BackingStore;
    use crate::core::error::ErrorKind;

    #[test]
    fn create_then_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db1");
        BackingStore::create(&path).expect("create");
        assert_eq!(std::fs::metadata(&path).expect("meta").len(), 0);
        let store = BackingStore::open(&path).expect("open");
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn create_twice_is_already_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db1");
        BackingStore::create(&path).expect("create");
        let err = BackingStore::create(&path).expect_err("exists");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn open_missing_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = BackingStore::open(dir.path().join("nope")).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn rewrite_and_append_preserve_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db1");
        let store = BackingStore::create(&path).expect("create");
        let mut lock = store.lock().expect("lock");
        assert!(lock.read_lines().expect("read").is_empty());

        let lines = vec!["".to_string(), "|t|".to_string(), "k|v".to_string()];
        lock.rewrite(&lines).expect("rewrite");
        assert_eq!(lock.read_lines().expect("read"), lines);

        lock.rewrite(&lines[..1]).expect("shrink");
        assert_eq!(lock.read_lines().expect("read"), vec!["".to_string()]);

        lock.append("x|y\n").expect("append");
        assert_eq!(
            lock.read_lines().expect("read"),
            vec!["".to_string(), "x|y".to_string()]
        );
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db1");
        std::fs::write(&path, [0xff, 0xfe, b'\n']).expect("write");
        let store = BackingStore::open(&path).expect("open");
        let err = store.lock().expect("lock").read_lines().expect_err("corrupt");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn lock_errors_map_to_expected_kinds() {
        let err = std::io::Error::from_raw_os_error(libc::EAGAIN);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Busy);

        let err = std::io::Error::from_raw_os_error(libc::EACCES);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Permission);

        let err = std::io::Error::from_raw_os_error(libc::EBADF);
        assert_eq!(super::lock_error_kind(&err), ErrorKind::Io);
    }
}
