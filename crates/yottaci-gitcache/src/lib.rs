//! Shared mirror cache for remote repositories.
//!
//! Mirrors live on durable shared storage and serve as `--reference` sources
//! for cheap workspace clones. Mutation is guarded by [`CacheLock`], an
//! advisory sentinel that concurrent runs skip rather than wait on: mirror
//! freshness only affects clone speed, never build correctness.

pub mod cache;
pub mod error;
pub mod lock;

pub use cache::RepoCache;
pub use error::CacheError;
pub use lock::CacheLock;
