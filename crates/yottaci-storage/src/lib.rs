//! Append-only log sink and result queue bindings.
//!
//! The orchestration engine only sees the two narrow traits in [`sink`];
//! the [`azure`] module provides the production REST bindings, and
//! [`memory`] (behind the `test-utils` feature) provides in-process doubles
//! for engine tests.

pub mod azure;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod sink;

pub use azure::{AppendBlobClient, LOG_CONTAINER, QueueClient, RESULT_QUEUE, StorageCredentials};
pub use error::StorageError;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryLogSink, MemoryQueue};
pub use sink::{LogSink, ResultQueue};
