use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use fs4::fs_std::FileExt;
use tracing::debug;
use crate::error::{HvmError, Result};

/// Advisory exclusive lock held for the lifetime of the guard.
///
/// Serialises concurrent installs of the same tool; the lock is released
/// when the guard is dropped (or the process exits).
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Blocks until the lock at `path` is acquired, creating the file and its parent if needed.
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HvmError::DirectoryCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| HvmError::Lock {
                path: path.clone(),
                source: e,
            })?;
        FileExt::lock_exclusive(&file).map_err(|e| HvmError::Lock {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), "acquired install lock");
        Ok(Self { file, path })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "released install lock");
    }
}
