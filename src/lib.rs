//! yottaci - single-shot CI build orchestrator for OpenEmbedded/bitbake.
//!
//! One invocation builds exactly one configuration of one task: it reads the
//! persisted task document, resolves the build configuration from the
//! repository's `.yottaci.yml`, assembles a fresh workspace from shared git
//! mirrors, runs the bitbake build with live log streaming, and reports the
//! result to the hosting provider and the result queue.
//!
//! The pipeline itself lives in [`yottaci_engine`]; this crate wires the
//! production collaborators together and exposes the CLI.

pub mod cli;
pub mod logging;
pub mod startup;

pub use yottaci_engine::{Orchestrator, OrchestratorConfig, PipelineError, RunContext, RunState};
