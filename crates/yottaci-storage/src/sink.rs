//! Contracts the orchestration engine depends on.

use async_trait::async_trait;

use crate::error::StorageError;

/// Append-only log destination keyed by run id.
///
/// Appends must land in call order; the build runner awaits each append
/// before reading the next output chunk, so implementations need no internal
/// ordering of their own.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Public URL of the log object, used as the commit status target.
    fn url(&self) -> String;
}

/// Destination for the single per-run result message.
#[async_trait]
pub trait ResultQueue: Send + Sync {
    async fn enqueue(&self, message: &str) -> Result<(), StorageError>;
}
