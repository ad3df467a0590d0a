//! The build orchestration engine.
//!
//! [`Orchestrator::run`] drives one build end to end: mirror sync, workspace
//! assembly, state restore, the build itself, then a finalize sequence shared
//! by the success and failure paths (save state, report, enqueue). Failure
//! anywhere short-circuits into the same finalize with the failure outcome,
//! so the system always ends in a recoverable, reported state.

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use context::RunContext;
pub use error::PipelineError;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use state::RunState;
