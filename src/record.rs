//! Per-package result of a scan.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    changelog::UNKNOWN_VERSION,
    forge::{
        config::HostKind,
        types::{ChangelogLocation, CommitInfo},
    },
};

/// Outcome of the changelog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangelogStatus {
    Found,
    /// Every location answered "not found".
    NotFound,
    /// At least one location could not be retrieved.
    Failed,
}

/// Version and commit information for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    pub host: HostKind,
    pub name: String,
    /// Changelog version, or [`UNKNOWN_VERSION`].
    pub version: String,
    pub commit_hash: Option<String>,
    pub commit_date: Option<DateTime<Utc>>,
    pub changelog_branch: Option<String>,
    pub changelog_path: Option<String>,
    pub changelog: ChangelogStatus,
}

impl PackageRecord {
    /// Record for a package whose changelog could not be read.
    pub fn unknown(
        host: HostKind,
        name: impl Into<String>,
        changelog: ChangelogStatus,
    ) -> Self {
        Self {
            host,
            name: name.into(),
            version: UNKNOWN_VERSION.to_string(),
            commit_hash: None,
            commit_date: None,
            changelog_branch: None,
            changelog_path: None,
            changelog,
        }
    }

    pub fn found(
        host: HostKind,
        name: impl Into<String>,
        version: String,
        location: ChangelogLocation,
        commit: Option<CommitInfo>,
    ) -> Self {
        let (commit_hash, commit_date) = match commit {
            Some(commit) => (Some(commit.sha), commit.date),
            None => (None, None),
        };

        Self {
            host,
            name: name.into(),
            version,
            commit_hash,
            commit_date,
            changelog_branch: location.branch,
            changelog_path: Some(location.path),
            changelog: ChangelogStatus::Found,
        }
    }

    pub fn has_known_version(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }

    /// Abbreviated commit hash in the host's convention.
    pub fn short_hash(&self) -> Option<&str> {
        self.commit_hash
            .as_deref()
            .map(|sha| short_sha(sha, self.host.short_sha_len()))
    }

    /// Debian snapshot string such as `git20240101.abc1234`. Needs both the
    /// commit hash and its date.
    pub fn snapshot(&self) -> Option<String> {
        let date = self.commit_date?;
        let hash = self.short_hash()?;
        Some(format!("git{}.{hash}", date.format("%Y%m%d")))
    }
}

fn short_sha(sha: &str, len: usize) -> &str {
    match sha.char_indices().nth(len) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}
