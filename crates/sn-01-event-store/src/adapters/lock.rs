//! # Data Directory Locking
//!
//! Two log stores appending to the same table files from different
//! processes would interleave rows and race on `seq_num`. The store takes an
//! exclusive `flock` on `<data_dir>/LOCK` for its whole lifetime.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use shared_types::StreamError;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors from data directory locking
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock file could not be created
    #[error("Failed to create lock file: {0}")]
    CreateFailed(io::Error),

    /// Directory is already locked by another store
    #[error("Data directory already in use{} ({})", holder(.pid), .path.display())]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },

    /// Failed to write PID to lock file
    #[error("Failed to write PID to lock file: {0}")]
    WriteFailed(io::Error),
}

fn holder(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" by process {}", p)).unwrap_or_default()
}

impl From<LockError> for StreamError {
    fn from(err: LockError) -> Self {
        StreamError::Storage(err.to_string())
    }
}

// =============================================================================
// DATA DIRECTORY LOCK
// =============================================================================

/// Exclusive lock on a data directory, released on drop.
pub struct DataDirLock {
    /// The lock file handle (kept open to maintain lock)
    file: File,
    /// Path to the lock file
    path: PathBuf,
}

impl DataDirLock {
    /// Lock file name
    pub const LOCK_FILE: &'static str = "LOCK";

    /// Acquire an exclusive lock on `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `LockError::AlreadyLocked` if another holder has the lock.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        let lock_path = data_dir.join(Self::LOCK_FILE);

        // Do not truncate before holding the lock: the PID belongs to the holder.
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(LockError::CreateFailed)?;

        if file.try_lock_exclusive().is_err() {
            return Err(LockError::AlreadyLocked {
                pid: Self::read_existing_pid(&lock_path),
                path: lock_path,
            });
        }

        file.set_len(0).map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", std::process::id()).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        Ok(Self {
            file,
            path: lock_path,
        })
    }

    /// Get the path to the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_writes_pid() {
        let dir = tempfile::tempdir().unwrap();

        let lock = DataDirLock::acquire(dir.path()).expect("Should acquire lock");
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim().parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn test_double_lock_fails() {
        let dir = tempfile::tempdir().unwrap();

        let _lock = DataDirLock::acquire(dir.path()).expect("First lock should succeed");
        let result = DataDirLock::acquire(dir.path());

        match result {
            Err(LockError::AlreadyLocked { pid, .. }) => {
                // The holder's PID survives the failed attempt.
                assert_eq!(pid, Some(std::process::id()));
            }
            other => panic!("expected AlreadyLocked, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _lock = DataDirLock::acquire(dir.path()).expect("Should acquire");
        }
        assert!(DataDirLock::acquire(dir.path()).is_ok());
    }
}
