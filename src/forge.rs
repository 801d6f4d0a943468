//! Upstream hosts that publish INDI driver packaging.
//!
//! Both hosts implement [`traits::PackageSource`]: list candidates, describe
//! where a candidate's changelog may live, fetch files and resolve commits.

/// Host constants and connection configuration.
pub mod config;

/// indi-3rdparty monorepo on GitHub.
pub mod github;

/// Debian Astro team projects on Salsa (GitLab).
pub mod gitlab;

/// Common trait for host abstraction.
pub mod traits;

/// Shared data types for candidates, changelog locations and commits.
pub mod types;
