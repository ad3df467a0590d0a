use thiserror::Error;
use yottaci_config::TaskError;
use yottaci_gitcache::CacheError;
use yottaci_github::GithubError;
use yottaci_runner::RunnerError;
use yottaci_statecache::StateCacheError;
use yottaci_storage::StorageError;
use yottaci_workspace::WorkspaceError;

/// Pipeline-level failures.
///
/// A non-zero build exit becomes [`PipelineError::BuildFailed`] and is
/// recovered into the failure path rather than propagated raw; everything
/// else is a hard stop that still goes through failure finalization.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("build exited with code {0}")]
    BuildFailed(i32),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    State(#[from] StateCacheError),

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Task(#[from] TaskError),
}
