//! The sentinel-file lock over the mirror cache.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;

use crate::error::CacheError;

/// Mutual-exclusion marker for cache writers.
///
/// Check-then-create on purpose: the window between the existence check and
/// the create is not atomic across processes, and losing that race only means
/// two runs refresh the same mirrors. A blocking or atomic lock would trade
/// that harmless race for stalls on a network filesystem. The sentinel is
/// removed on drop, including on failure paths, so a crashed sync never
/// wedges the cache for later runs.
#[derive(Debug)]
pub struct CacheLock {
    path: Utf8PathBuf,
}

impl CacheLock {
    /// Take the lock if the sentinel does not already exist.
    ///
    /// Returns `None` when another run holds it; callers skip their sync
    /// instead of waiting.
    pub fn try_acquire(path: &Utf8Path) -> Result<Option<Self>, CacheError> {
        if path.exists() {
            return Ok(None);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::File::create(path)?;
        Ok(Some(Self {
            path: path.to_owned(),
        }))
    }

    /// Remove the sentinel now instead of at end of scope.
    pub fn release(self) {}
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path, error = %err, "failed to remove cache lock sentinel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("git.lock")).unwrap()
    }

    #[test]
    fn acquire_creates_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(&dir);
        let lock = CacheLock::try_acquire(&path).unwrap().unwrap();
        assert!(path.exists());
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn held_lock_is_not_reacquired() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(&dir);
        let _held = CacheLock::try_acquire(&path).unwrap().unwrap();
        assert!(CacheLock::try_acquire(&path).unwrap().is_none());
    }

    #[test]
    fn foreign_sentinel_blocks_acquisition() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(&dir);
        std::fs::write(&path, "").unwrap();
        assert!(CacheLock::try_acquire(&path).unwrap().is_none());
    }

    #[test]
    fn release_removes_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(&dir);
        let lock = CacheLock::try_acquire(&path).unwrap().unwrap();
        lock.release();
        assert!(!path.exists());
        assert!(CacheLock::try_acquire(&path).unwrap().is_some());
    }
}
