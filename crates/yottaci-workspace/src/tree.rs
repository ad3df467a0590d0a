//! Workspace directory assembly.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::info;
use yottaci_config::{BuildConfig, BuildTask, RepoDescriptor, repo_dir_name};
use yottaci_gitcache::RepoCache;
use yottaci_runner::{ProcessRunner, RunnerError};

/// Errors assembling the workspace. All fatal: a half-assembled tree is
/// never built.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("git {operation} in {repo} exited with {code}")]
    Git {
        operation: String,
        repo: String,
        code: i32,
    },

    #[error("pull-request task has no contributor clone URL")]
    MissingContributorUrl,
}

/// One run's source tree.
pub struct Workspace {
    dir: Utf8PathBuf,
}

impl Workspace {
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Where restored build state lands and the build writes new state.
    pub fn state_dir(&self) -> Utf8PathBuf {
        self.dir.join("sstate")
    }

    fn subject_dir(&self, task: &BuildTask) -> Utf8PathBuf {
        self.dir.join(repo_dir_name(&task.repo_url))
    }

    /// Build the source tree for one run.
    ///
    /// Discards any previous workspace, writes `build/conf/auto.conf`,
    /// reference-clones every repository, pins refs, and for pull requests
    /// fetches the contributor remote. The subject repository always ends up
    /// checked out at the task's exact commit, never a branch tip.
    pub async fn assemble(
        &self,
        runner: &ProcessRunner,
        task: &BuildTask,
        config: &BuildConfig,
        cache: &RepoCache,
        repos: &[RepoDescriptor],
        downloads_dir: &Utf8Path,
    ) -> Result<(), WorkspaceError> {
        if self.dir.exists() {
            info!(workspace = %self.dir, "discarding previous workspace");
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(self.dir.join("build/conf"))?;

        self.write_auto_conf(config, downloads_dir)?;

        for repo in repos {
            let mirror = cache.mirror_path(repo);
            self.git(
                runner,
                &self.dir,
                &[
                    "clone",
                    "--reference",
                    mirror.as_str(),
                    repo.url.as_str(),
                    repo.dir_name.as_str(),
                ],
                &repo.url,
            )
            .await?;

            if let Some(git_ref) = &repo.git_ref {
                info!(repo = %repo.dir_name, git_ref = %git_ref, "checking out pinned ref");
                self.git(
                    runner,
                    &self.dir.join(&repo.dir_name),
                    &["checkout", git_ref.as_str()],
                    &repo.url,
                )
                .await?;
            }
        }

        let subject = self.subject_dir(task);
        if task.pull_request {
            let contributor = task
                .contributor_url
                .as_deref()
                .ok_or(WorkspaceError::MissingContributorUrl)?;
            info!(remote = contributor, "adding contributor remote");
            self.git(
                runner,
                &subject,
                &["remote", "add", "contributor", contributor],
                &task.repo_url,
            )
            .await?;
            self.git(runner, &subject, &["fetch", "contributor"], &task.repo_url)
                .await?;
        }
        info!(sha = %task.sha, "pinning subject repository");
        self.git(runner, &subject, &["checkout", task.sha.as_str()], &task.repo_url)
            .await?;

        Ok(())
    }

    /// `auto.conf`: the configuration's free-form settings plus the fixed
    /// cache locations.
    fn write_auto_conf(
        &self,
        config: &BuildConfig,
        downloads_dir: &Utf8Path,
    ) -> Result<(), WorkspaceError> {
        let contents = format!(
            "\n{localconf}\n\nDL_DIR = \"{downloads}\"\nSSTATE_DIR = \"{sstate}\"\n",
            localconf = config.localconf,
            downloads = downloads_dir,
            sstate = self.state_dir(),
        );
        fs::write(self.dir.join("build/conf/auto.conf"), contents)?;
        Ok(())
    }

    async fn git(
        &self,
        runner: &ProcessRunner,
        cwd: &Utf8Path,
        args: &[&str],
        repo: &str,
    ) -> Result<(), WorkspaceError> {
        let mut cmd = vec!["git".to_string()];
        cmd.extend(args.iter().map(|s| (*s).to_string()));
        let code = runner.run(&cmd, cwd).await?;
        if code != 0 {
            return Err(WorkspaceError::Git {
                operation: args.first().copied().unwrap_or("git").to_string(),
                repo: repo.to_string(),
                code,
            });
        }
        Ok(())
    }
}
