//! Cross-process cycle lock
//!
//! The in-memory guard of [`CheckEngine`](crate::CheckEngine) only covers one
//! process. The daemon and `snapwatch check` both take an exclusive advisory
//! lock on a shared lock file for the duration of a cycle, so their storage
//! calls and credential writes never interleave.
//!
//! The lock is released when the [`CycleLockGuard`] is dropped, or by the OS
//! when the holding process dies.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::MonitorError;

/// Lock file shared by every process that runs check cycles
#[derive(Debug, Clone)]
pub struct CycleLock {
    path: PathBuf,
}

/// Proof of holding the [`CycleLock`]
#[derive(Debug)]
pub struct CycleLockGuard {
    _file: File,
}

impl CycleLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the lock without waiting
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub fn try_acquire(&self) -> Result<Option<CycleLockGuard>, MonitorError> {
        let file = self.open().map_err(|source| MonitorError::Lock {
            path: self.path.clone(),
            source,
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cycle lock acquired");
                Ok(Some(CycleLockGuard { _file: file }))
            }
            Err(e) if is_contended(&e) => Ok(None),
            Err(source) => Err(MonitorError::Lock {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
