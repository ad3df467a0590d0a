use thiserror::Error;
use yottaci_runner::RunnerError;

/// Errors touching the mirror cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("mirror cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("git {operation} for {repo} exited with {code}")]
    Git {
        operation: &'static str,
        repo: String,
        code: i32,
    },
}
