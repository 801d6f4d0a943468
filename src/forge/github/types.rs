use serde::Deserialize;

pub const CONTENT_TYPE_DIR: &str = "dir";

/// Entry of a repository contents listing.
#[derive(Debug, Deserialize)]
pub struct GithubContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubCommitSignature {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GithubCommitDetail {
    pub committer: Option<GithubCommitSignature>,
}

/// Item of the commits listing.
#[derive(Debug, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    pub commit: GithubCommitDetail,
}
