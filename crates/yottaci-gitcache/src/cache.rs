//! Mirror synchronization.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};
use yottaci_config::RepoDescriptor;
use yottaci_runner::ProcessRunner;

use crate::error::CacheError;
use crate::lock::CacheLock;

/// The shared bare-repository mirror area.
pub struct RepoCache {
    repos_dir: Utf8PathBuf,
    lock_path: Utf8PathBuf,
}

impl RepoCache {
    pub fn new(repos_dir: Utf8PathBuf, lock_path: Utf8PathBuf) -> Self {
        Self {
            repos_dir,
            lock_path,
        }
    }

    /// Mirror directory a descriptor clones from.
    pub fn mirror_path(&self, repo: &RepoDescriptor) -> Utf8PathBuf {
        self.repos_dir.join(&repo.dir_name)
    }

    /// Refresh every mirror under the advisory lock.
    ///
    /// When another run holds the lock the whole sync is skipped without
    /// error; stale mirrors only cost clone time. Individual repository
    /// failures are logged and skipped, and the lock is released either way.
    pub async fn sync(
        &self,
        runner: &ProcessRunner,
        repos: &[RepoDescriptor],
    ) -> Result<(), CacheError> {
        fs::create_dir_all(&self.repos_dir)?;

        let Some(lock) = CacheLock::try_acquire(&self.lock_path)? else {
            info!("mirror cache locked by another run, skipping sync");
            return Ok(());
        };

        for repo in repos {
            if let Err(err) = self.sync_one(runner, repo).await {
                warn!(repo = %repo.url, error = %err, "mirror sync failed, continuing");
            }
        }

        lock.release();
        Ok(())
    }

    async fn sync_one(
        &self,
        runner: &ProcessRunner,
        repo: &RepoDescriptor,
    ) -> Result<(), CacheError> {
        let mirror = self.mirror_path(repo);
        if mirror.is_dir() {
            info!(repo = %repo.url, "fetching mirror");
            let code = runner
                .run(&["git".to_string(), "fetch".to_string()], &mirror)
                .await?;
            if code != 0 {
                return Err(CacheError::Git {
                    operation: "fetch",
                    repo: repo.url.clone(),
                    code,
                });
            }
        } else {
            info!(repo = %repo.url, "cloning bare mirror");
            let code = runner
                .run(
                    &[
                        "git".to_string(),
                        "clone".to_string(),
                        "--bare".to_string(),
                        repo.url.clone(),
                        repo.dir_name.clone(),
                    ],
                    &self.repos_dir,
                )
                .await?;
            if code != 0 {
                return Err(CacheError::Git {
                    operation: "clone",
                    repo: repo.url.clone(),
                    code,
                });
            }
        }
        Ok(())
    }

    pub fn repos_dir(&self) -> &Utf8Path {
        &self.repos_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::sync::Arc;
    use yottaci_storage::MemoryLogSink;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }

    fn git_in(dir: &Utf8Path, args: &[&str]) {
        let status = Command::new("git")
            .args([
                "-c",
                "user.email=ci@example.com",
                "-c",
                "user.name=ci",
                "-c",
                "init.defaultBranch=main",
            ])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed in {dir}");
    }

    fn init_source_repo(dir: &Utf8Path) {
        git_in(dir, &["init", "-q"]);
        std::fs::write(dir.join("README"), "mirror me\n").unwrap();
        git_in(dir, &["add", "README"]);
        git_in(dir, &["commit", "-q", "-m", "initial"]);
    }

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn held_lock_skips_sync_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        let repos_dir = root.join("gitrepos");
        let lock_path = repos_dir.join("yottaci-git.lock");
        std::fs::create_dir_all(&repos_dir).unwrap();
        std::fs::write(&lock_path, "").unwrap();

        let cache = RepoCache::new(repos_dir.clone(), lock_path.clone());
        let sink = Arc::new(MemoryLogSink::new());
        let runner = ProcessRunner::new(sink.clone());
        let repo = RepoDescriptor::new("https://example.com/acme/meta-widget.git", None, None);

        cache.sync(&runner, &[repo.clone()]).await.unwrap();

        // No mirror mutation and no git invocation happened.
        assert!(!cache.mirror_path(&repo).exists());
        assert_eq!(sink.append_count(), 0);
        // The foreign sentinel is left in place.
        assert!(lock_path.exists());
    }

    #[tokio::test]
    async fn sync_clones_then_fetches_and_releases_lock() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        let source = root.join("source");
        std::fs::create_dir_all(&source).unwrap();
        init_source_repo(&source);

        let repos_dir = root.join("gitrepos");
        let lock_path = repos_dir.join("yottaci-git.lock");
        let cache = RepoCache::new(repos_dir.clone(), lock_path.clone());
        let runner = ProcessRunner::new(Arc::new(MemoryLogSink::new()));
        let repo = RepoDescriptor::new(source.as_str(), None, None);

        cache.sync(&runner, &[repo.clone()]).await.unwrap();
        let mirror = cache.mirror_path(&repo);
        assert!(mirror.is_dir());
        // Bare repository, not a working tree.
        assert!(mirror.join("HEAD").exists());
        assert!(!mirror.join(".git").exists());
        assert!(!lock_path.exists());

        // Second sync takes the fetch path.
        cache.sync(&runner, &[repo]).await.unwrap();
        assert!(!lock_path.exists());
    }

    #[tokio::test]
    async fn failed_repo_sync_still_releases_lock() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        let repos_dir = root.join("gitrepos");
        let lock_path = repos_dir.join("yottaci-git.lock");
        let cache = RepoCache::new(repos_dir, lock_path.clone());
        let runner = ProcessRunner::new(Arc::new(MemoryLogSink::new()));
        let bogus = RepoDescriptor::new(root.join("does-not-exist").as_str(), None, None);

        // Per-repository failure is swallowed; the lock must not leak.
        cache.sync(&runner, &[bogus]).await.unwrap();
        assert!(!lock_path.exists());
    }
}
