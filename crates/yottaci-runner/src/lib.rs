//! Child process execution with live log streaming.
//!
//! One build step at a time: [`ProcessRunner::run`] blocks the calling task
//! until the child exits, forwarding every output chunk to the console and
//! the run's remote log as it is produced.

pub mod error;
pub mod process;

pub use error::RunnerError;
pub use process::ProcessRunner;
