use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A directory or project discovered by a lister, not yet known to have a
/// changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Package name as reported and matched against the ignore list.
    pub name: String,
    /// Host-specific identifier used in API paths.
    pub id: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// One entry in a changelog fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogLocation {
    /// Ref to read from. `None` means the host's default branch.
    pub branch: Option<String>,
    /// Path relative to the repository root.
    pub path: String,
}

impl ChangelogLocation {
    pub fn new(branch: Option<String>, path: impl Into<String>) -> Self {
        Self {
            branch,
            path: path.into(),
        }
    }

    pub fn on_branch(
        branch: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(Some(branch.into()), path)
    }

    pub fn on_default_branch(path: impl Into<String>) -> Self {
        Self::new(None, path)
    }
}

impl fmt::Display for ChangelogLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}@{}", self.path, branch),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Raw changelog text and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
    pub content: String,
    pub location: ChangelogLocation,
}

/// Head commit associated with a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub date: Option<DateTime<Utc>>,
}

impl CommitInfo {
    /// Builds commit info, dropping dates that are not valid RFC 3339.
    pub fn from_rfc3339(sha: impl Into<String>, date: Option<&str>) -> Self {
        let date = date.and_then(|d| {
            DateTime::parse_from_rfc3339(d)
                .map(|d| d.with_timezone(&Utc))
                .ok()
        });

        Self {
            sha: sha.into(),
            date,
        }
    }
}
