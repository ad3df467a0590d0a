//! Directory layout for one orchestrator invocation.

use camino::Utf8PathBuf;

/// Resolved directory layout.
///
/// The fileshare root is durable shared storage (git mirrors, state archives,
/// diagnostic logs); the work dir is node-local scratch holding the
/// per-run workspace.
#[derive(Debug, Clone)]
pub struct Layout {
    pub fileshare: Utf8PathBuf,
    pub workdir: Utf8PathBuf,
}

impl Layout {
    pub fn new(fileshare: impl Into<Utf8PathBuf>, workdir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            fileshare: fileshare.into(),
            workdir: workdir.into(),
        }
    }

    /// Production defaults used on build agents.
    pub fn production() -> Self {
        Self::new("/fileshare", "/data/yottaci")
    }

    /// Shared bare-repository mirrors.
    pub fn repos_dir(&self) -> Utf8PathBuf {
        self.fileshare.join("gitrepos")
    }

    /// Sentinel file guarding mirror mutation.
    pub fn cache_lock_path(&self) -> Utf8PathBuf {
        self.repos_dir().join("yottaci-git.lock")
    }

    /// Durable per-run diagnostic logs.
    pub fn log_dir(&self) -> Utf8PathBuf {
        self.fileshare.join("logs")
    }

    pub fn run_log_dir(&self, run_id: &str) -> Utf8PathBuf {
        self.log_dir().join(run_id)
    }

    /// Shared bitbake cache area: download cache and state archives.
    pub fn bb_cache_dir(&self) -> Utf8PathBuf {
        self.fileshare.join("bb-cache")
    }

    pub fn downloads_dir(&self) -> Utf8PathBuf {
        self.bb_cache_dir().join("downloads")
    }

    /// Per-run workspace; discarded and rebuilt at the start of every run.
    pub fn workspace_dir(&self) -> Utf8PathBuf {
        self.workdir.join("workspace")
    }
}
