//! Implements the PackageSource trait for the indi-3rdparty monorepo on GitHub
use async_trait::async_trait;
use log::*;
use reqwest::{
    Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};

use crate::{
    error::Result,
    forge::{
        config::{
            DEFAULT_PAGE_SIZE, GITHUB_NON_DRIVER_DIRS, GITHUB_OWNER,
            GITHUB_REPO, HostConfig, HostKind,
        },
        github::types::{CONTENT_TYPE_DIR, GithubCommit, GithubContentEntry},
        traits::PackageSource,
        types::{Candidate, ChangelogLocation, CommitInfo},
    },
    http::client::RateLimitedClient,
};

mod types;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

/// Lists driver directories of indi-3rdparty and reads their changelogs from
/// `debian/<driver>/changelog`.
pub struct Github {
    client: RateLimitedClient,
    headers: HeaderMap,
    repo_url: Url,
}

impl Github {
    pub fn new(config: HostConfig) -> Result<Self> {
        let client = config.client()?;
        Self::with_client(config, client)
    }

    /// Builds the source around an existing client.
    pub fn with_client(
        config: HostConfig,
        client: RateLimitedClient,
    ) -> Result<Self> {
        let mut headers = config.auth_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let repo_url = config
            .api_url
            .join(&format!("repos/{GITHUB_OWNER}/{GITHUB_REPO}/"))?;

        Ok(Self {
            client,
            headers,
            repo_url,
        })
    }

    fn changelog_path(driver: &str) -> String {
        format!("debian/{driver}/changelog")
    }
}

#[async_trait]
impl PackageSource for Github {
    fn kind(&self) -> HostKind {
        HostKind::Github
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let mut contents_url = self.repo_url.join("contents")?;
        contents_url
            .query_pairs_mut()
            .append_pair("per_page", &DEFAULT_PAGE_SIZE.to_string())
            .append_pair("page", "1");

        info!("fetching repository contents: {contents_url}");

        let entries: Vec<GithubContentEntry> = self
            .client
            .get_paginated(contents_url, &self.headers)
            .await?;

        let candidates = entries
            .into_iter()
            .filter(|entry| entry.kind == CONTENT_TYPE_DIR)
            .filter(|entry| {
                !GITHUB_NON_DRIVER_DIRS.contains(&entry.name.as_str())
            })
            .map(|entry| Candidate::new(entry.name.clone(), entry.name))
            .collect::<Vec<_>>();

        info!("found {} driver directories", candidates.len());

        Ok(candidates)
    }

    async fn changelog_locations(
        &self,
        candidate: &Candidate,
    ) -> Vec<ChangelogLocation> {
        vec![ChangelogLocation::on_default_branch(Self::changelog_path(
            &candidate.name,
        ))]
    }

    async fn fetch_file(
        &self,
        _candidate: &Candidate,
        location: &ChangelogLocation,
    ) -> Result<Option<String>> {
        let mut file_url =
            self.repo_url.join(&format!("contents/{}", location.path))?;

        if let Some(branch) = &location.branch {
            file_url.query_pairs_mut().append_pair("ref", branch);
        }

        let mut headers = self.headers.clone();
        headers.insert(ACCEPT, HeaderValue::from_static(RAW_MEDIA_TYPE));

        let response = self.client.get(&file_url, &headers).await?;
        if response.is_not_found() {
            return Ok(None);
        }

        let response = response.error_for_status(&file_url)?;
        Ok(Some(response.body))
    }

    async fn latest_commit(
        &self,
        candidate: &Candidate,
        location: &ChangelogLocation,
    ) -> Result<Option<CommitInfo>> {
        let mut commits_url = self.repo_url.join("commits")?;

        commits_url
            .query_pairs_mut()
            .append_pair("path", &candidate.name)
            .append_pair("per_page", "1");

        if let Some(branch) = &location.branch {
            commits_url.query_pairs_mut().append_pair("sha", branch);
        }

        let response = self
            .client
            .get(&commits_url, &self.headers)
            .await?
            .error_for_status(&commits_url)?;

        let commits: Vec<GithubCommit> = response.json()?;

        Ok(commits.into_iter().next().map(|commit| {
            let date = commit.commit.committer.and_then(|c| c.date);
            CommitInfo::from_rfc3339(commit.sha, date.as_deref())
        }))
    }
}
