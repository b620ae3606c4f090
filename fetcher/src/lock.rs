//! Advisory lock guarding one artefact target path.
//!
//! Two runs against the same target would otherwise race between the
//! existence check, the download, and the removal of an untrusted file.

use crate::artefact::error::{ArtefactError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};

/// An exclusive lock held until the guard is dropped.
#[derive(Debug)]
pub struct ArtefactLock {
    file: File,
    path: Utf8PathBuf,
}

impl ArtefactLock {
    /// Block until an exclusive lock on `path` is held.
    ///
    /// The lock file and its parent directories are created when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::Io`] if the lock file cannot be opened or
    /// locked.
    pub fn acquire(path: &Utf8Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ArtefactError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| ArtefactError::io(path, e))?;
        file.lock_exclusive()
            .map_err(|e| ArtefactError::io(path, e))?;
        log::debug!("acquired artefact lock {path}");
        Ok(Self {
            file,
            path: path.to_owned(),
        })
    }

    /// The path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for ArtefactLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::debug!("failed to release artefact lock {}: {e}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_path(temp: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp.path().join("cache").join("a.zip.lock")).expect("UTF-8 path")
    }

    #[test]
    fn acquire_creates_lock_file_and_parents() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = lock_path(&temp);

        let lock = ArtefactLock::acquire(&path).expect("lock");
        assert!(path.exists());
        assert_eq!(lock.path(), path.as_path());
    }

    #[test]
    fn lock_can_be_reacquired_after_release() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = lock_path(&temp);

        drop(ArtefactLock::acquire(&path).expect("first lock"));
        let second = ArtefactLock::acquire(&path);
        assert!(second.is_ok());
    }

    #[test]
    fn held_lock_excludes_other_handles() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = lock_path(&temp);

        let _held = ArtefactLock::acquire(&path).expect("lock");
        let other = OpenOptions::new()
            .write(true)
            .open(&path)
            .expect("open lock file");
        assert!(other.try_lock_exclusive().is_err());
    }
}
