//! GitHub App bindings: installation token minting, commit statuses and
//! configuration document fetch.
//!
//! Installation tokens expire after an hour, shorter than a typical build.
//! Instead of re-authenticating at one hardcoded point, [`GithubClient`]
//! refreshes its cached token in front of every API call once it nears
//! expiry, so long builds and long status gaps behave the same.

pub mod auth;
pub mod client;
pub mod error;
pub mod reporter;

pub use auth::AppAuth;
pub use client::{GithubClient, StatusState};
pub use error::GithubError;
pub use reporter::{CommitStatusReporter, StatusReporter};
