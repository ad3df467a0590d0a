//! The process runner.

use std::io::Write as _;
use std::process::Stdio;
use std::sync::Arc;

use camino::Utf8Path;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;
use yottaci_storage::LogSink;

use crate::error::RunnerError;

const READ_BUF_SIZE: usize = 8192;

/// Runs one external command at a time, streaming its combined output.
///
/// Output draining and exit waiting are the only concurrent pair in a run:
/// the select loop forwards chunks while the child executes, and both are
/// joined before [`ProcessRunner::run`] returns. Each chunk is forwarded to
/// the console and appended to the remote log before the next read, so
/// append order matches production order and nothing buffers the whole
/// output in memory.
pub struct ProcessRunner {
    sink: Arc<dyn LogSink>,
}

impl ProcessRunner {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Spawn `cmd` in `cwd` with no input stream and wait for it to exit.
    ///
    /// Returns the child's exit code; non-zero is a plain value, not an
    /// error. Children terminated by a signal surface as `-1`.
    pub async fn run(&self, cmd: &[String], cwd: &Utf8Path) -> Result<i32, RunnerError> {
        let (program, args) = cmd.split_first().ok_or(RunnerError::EmptyCommand)?;
        debug!(command = %cmd.join(" "), cwd = %cwd, "spawning child process");

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: program.clone(),
                source,
            })?;

        // Pipes are always present with Stdio::piped.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Output(std::io::Error::other("child stdout missing")))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::Output(std::io::Error::other("child stderr missing")))?;

        let mut out_buf = vec![0u8; READ_BUF_SIZE];
        let mut err_buf = vec![0u8; READ_BUF_SIZE];
        let mut out_open = true;
        let mut err_open = true;

        while out_open || err_open {
            tokio::select! {
                read = stdout.read(&mut out_buf), if out_open => match read {
                    Ok(0) => out_open = false,
                    Ok(n) => self.forward(&out_buf[..n]).await?,
                    Err(err) => return Err(RunnerError::Output(err)),
                },
                read = stderr.read(&mut err_buf), if err_open => match read {
                    Ok(0) => err_open = false,
                    Ok(n) => self.forward(&err_buf[..n]).await?,
                    Err(err) => return Err(RunnerError::Output(err)),
                },
            }
        }

        let status = child.wait().await.map_err(RunnerError::Wait)?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Write `script` to a temporary file and run it with `bash -xe`
    /// (abort on first error, echo commands). The file is removed when this
    /// returns, whatever the outcome.
    pub async fn run_script(&self, script: &str, cwd: &Utf8Path) -> Result<i32, RunnerError> {
        let mut file = NamedTempFile::new().map_err(RunnerError::Script)?;
        file.write_all(script.as_bytes())
            .and_then(|()| file.flush())
            .map_err(RunnerError::Script)?;

        let cmd = [
            "/bin/bash".to_string(),
            "-xe".to_string(),
            file.path().to_string_lossy().into_owned(),
        ];
        // `file` is dropped (and unlinked) after the child exits.
        self.run(&cmd, cwd).await
    }

    /// Forward one output chunk: console first, then the remote log, before
    /// the caller reads the next chunk. Console echo is best-effort.
    async fn forward(&self, chunk: &[u8]) -> Result<(), RunnerError> {
        let mut console = tokio::io::stdout();
        let _ = console.write_all(chunk).await;
        let _ = console.flush().await;
        self.sink.append(chunk).await?;
        Ok(())
    }
}
