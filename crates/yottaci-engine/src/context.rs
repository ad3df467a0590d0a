//! The per-run execution context.

use std::sync::Arc;

use yottaci_config::{BuildConfig, BuildTask, TaskData};
use yottaci_storage::{LogSink, ResultQueue};

/// Mutable execution context threaded through every component call.
///
/// Exactly one exists per process lifetime, owned by the orchestrator and
/// passed by reference. Never persisted.
pub struct RunContext {
    /// Derived from task identity and configuration index; keys the log
    /// blob, status links and diagnostic storage.
    pub run_id: String,
    pub task_data: TaskData,
    pub task: BuildTask,
    pub config: BuildConfig,
    pub log: Arc<dyn LogSink>,
    pub queue: Arc<dyn ResultQueue>,
}

impl RunContext {
    pub fn new(
        task_data: TaskData,
        task: BuildTask,
        config: BuildConfig,
        log: Arc<dyn LogSink>,
        queue: Arc<dyn ResultQueue>,
    ) -> Self {
        Self {
            run_id: task_data.run_id(),
            task_data,
            task,
            config,
            log,
            queue,
        }
    }
}
