//! Per-run source tree assembly.
//!
//! A workspace is always discarded and rebuilt from scratch: stale layer
//! configuration from a previous run is a known source of hard-to-diagnose
//! build failures. Repositories are cloned from the mirror cache with
//! `--reference`, sharing object data instead of duplicating it on disk.

pub mod script;
pub mod tree;

pub use script::{default_build_script, layer_commands};
pub use tree::{Workspace, WorkspaceError};
