use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GroupInfo {
    pub id: u64,
}

/// Project as returned by group project listings.
#[derive(Debug, Deserialize)]
pub struct ProjectInfo {
    pub id: u64,
    pub name: String,
    pub default_branch: Option<String>,
}

/// Information about the head commit of a branch.
#[derive(Debug, Deserialize)]
pub struct GitlabCommit {
    pub id: String,
    pub committed_date: Option<String>,
}
