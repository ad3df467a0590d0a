//! Task input, resolved build configuration and repository descriptors.
//!
//! Everything in this crate is immutable after process start: [`TaskData`] is
//! read once from the persisted task document, [`BuildConfig`] and
//! [`BuildTask`] are resolved once from it plus the fetched configuration
//! document, and [`Layout`] pins the directory layout for the whole run.

pub mod build;
pub mod error;
pub mod layout;
pub mod repo;
pub mod task;

pub use build::{BuildConfig, BuildTask, ConfigDocument, DependencySpec};
pub use error::{ConfigError, TaskError};
pub use layout::Layout;
pub use repo::{BITBAKE_URL, OECORE_URL, RepoDescriptor, build_repos, repo_dir_name};
pub use task::{EventType, GhEvent, GhRepository, TaskData};
