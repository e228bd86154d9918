use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a file, held until drop.
///
/// Dropping the lock unlocks and removes the lock file.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    fn open(path: &Path) -> Result<File> {
        if let Some(parent) = path.parent() {
            crate::ensure_dir(parent)?;
        }
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::Write {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Take the lock without waiting; [`Error::LockHeld`] if another holder exists.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(lock = %path.display(), "instance lock acquired");
                Ok(Self { file, path })
            }
            Err(e) if is_contended(&e) => Err(Error::LockHeld { path }),
            Err(e) => Err(Error::Lock { path, source: e }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::WouldBlock {
        return true;
    }
    if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
        return true;
    }
    #[cfg(windows)]
    if matches!(err.raw_os_error(), Some(32 | 33)) {
        return true;
    }
    false
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(lock = %self.path.display(), error = %e, "unable to release lock");
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "unable to remove lock file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".lock");
        let held = InstanceLock::try_acquire(&path).unwrap();
        let err = InstanceLock::try_acquire(&path).unwrap_err();
        assert!(matches!(err, Error::LockHeld { .. }));
        drop(held);
        assert!(!path.exists());
        InstanceLock::try_acquire(&path).unwrap();
    }
}
