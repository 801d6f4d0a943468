//! Traits related to upstream package hosts
use async_trait::async_trait;

use crate::{
    error::Result,
    forge::{
        config::HostKind,
        types::{Candidate, ChangelogLocation, CommitInfo},
    },
};

/// A host that can enumerate packages and serve their changelogs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageSource: Send + Sync {
    fn kind(&self) -> HostKind;

    /// Lists every candidate package, following pagination.
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;

    /// Ordered fallback chain of places a changelog may live. Lookups needed
    /// to build the chain are best-effort and never fail the candidate.
    async fn changelog_locations(
        &self,
        candidate: &Candidate,
    ) -> Vec<ChangelogLocation>;

    /// Fetches one file. `Ok(None)` means the host reported it missing.
    async fn fetch_file(
        &self,
        candidate: &Candidate,
        location: &ChangelogLocation,
    ) -> Result<Option<String>>;

    /// Most recent commit relevant to the changelog found at `location`.
    async fn latest_commit(
        &self,
        candidate: &Candidate,
        location: &ChangelogLocation,
    ) -> Result<Option<CommitInfo>>;
}
