use std::io;

use thiserror::Error;
use yottaci_storage::StorageError;

/// Errors from child process execution.
///
/// A non-zero exit code is not an error here; it is the return value of
/// [`crate::ProcessRunner::run`]. These variants cover failures to execute
/// or observe the child at all.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("cannot run an empty command")]
    EmptyCommand,

    #[error("failed to spawn `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("failed to read child output: {0}")]
    Output(io::Error),

    #[error("failed waiting for child exit: {0}")]
    Wait(io::Error),

    #[error("failed to stage script file: {0}")]
    Script(io::Error),

    #[error("remote log append failed: {0}")]
    Log(#[from] StorageError),
}
