//! Implements the PackageSource trait for the Debian Astro team on Salsa
use async_trait::async_trait;
use log::*;
use reqwest::{Url, header::HeaderMap};

use crate::{
    error::{CensusError, Result},
    forge::{
        config::{
            DEFAULT_BRANCH_GUESS, DEFAULT_PAGE_SIZE, GITLAB_CHANGELOG_PATHS,
            GITLAB_EXCLUDED_PROJECTS, GITLAB_GROUP, GITLAB_NAME_PREFIXES,
            GITLAB_PACKAGING_BRANCH, HostConfig, HostKind,
        },
        gitlab::types::{GitlabCommit, GroupInfo, ProjectInfo},
        traits::PackageSource,
        types::{Candidate, ChangelogLocation, CommitInfo},
    },
    http::client::RateLimitedClient,
};

mod types;

/// Lists INDI packaging projects of a GitLab group and searches each one's
/// branches for a Debian changelog.
pub struct Gitlab {
    client: RateLimitedClient,
    headers: HeaderMap,
    base_url: Url,
    group: String,
}

impl Gitlab {
    pub fn new(config: HostConfig) -> Result<Self> {
        let client = config.client()?;
        Self::with_client(config, client)
    }

    /// Builds the source around an existing client.
    pub fn with_client(
        config: HostConfig,
        client: RateLimitedClient,
    ) -> Result<Self> {
        Ok(Self {
            headers: config.auth_headers()?,
            base_url: config.api_url,
            client,
            group: GITLAB_GROUP.to_string(),
        })
    }

    async fn get_group_id(&self) -> Result<u64> {
        let group_url = self
            .base_url
            .join(&format!("groups/{}", urlencoding::encode(&self.group)))?;

        let response = self.client.get(&group_url, &self.headers).await?;
        if response.is_not_found() {
            return Err(CensusError::invalid_config(format!(
                "group {} not found",
                self.group
            )));
        }

        let group: GroupInfo =
            response.error_for_status(&group_url)?.json()?;

        Ok(group.id)
    }

    /// Default branch of a project, or [`DEFAULT_BRANCH_GUESS`] when the
    /// lookup fails.
    async fn get_default_branch(&self, project_id: &str) -> String {
        match self.fetch_default_branch(project_id).await {
            Ok(Some(branch)) => branch,
            Ok(None) => DEFAULT_BRANCH_GUESS.to_string(),
            Err(err) => {
                debug!(
                    "unable to resolve default branch for project \
                     {project_id}: {err}"
                );
                DEFAULT_BRANCH_GUESS.to_string()
            }
        }
    }

    async fn fetch_default_branch(
        &self,
        project_id: &str,
    ) -> Result<Option<String>> {
        let project_url =
            self.base_url.join(&format!("projects/{project_id}"))?;
        let project: ProjectInfo = self
            .client
            .get(&project_url, &self.headers)
            .await?
            .error_for_status(&project_url)?
            .json()?;
        Ok(project.default_branch)
    }
}

fn is_indi_project(name: &str) -> bool {
    GITLAB_NAME_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
        && !GITLAB_EXCLUDED_PROJECTS.contains(&name)
}

/// Branches to search, in priority order, without duplicates.
fn branch_order(default_branch: &str) -> Vec<String> {
    let mut branches: Vec<String> = vec![];
    let preferred =
        [GITLAB_PACKAGING_BRANCH, default_branch, DEFAULT_BRANCH_GUESS];
    for branch in preferred {
        if !branches.iter().any(|b| b == branch) {
            branches.push(branch.to_string());
        }
    }
    branches
}

#[async_trait]
impl PackageSource for Gitlab {
    fn kind(&self) -> HostKind {
        HostKind::Gitlab
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        info!("resolving group id for {}", self.group);
        let group_id = self.get_group_id().await?;

        let mut projects_url =
            self.base_url.join(&format!("groups/{group_id}/projects"))?;

        projects_url
            .query_pairs_mut()
            .append_pair("per_page", &DEFAULT_PAGE_SIZE.to_string())
            .append_pair("order_by", "name")
            .append_pair("sort", "asc")
            .append_pair("page", "1");

        info!("fetching projects of group {}", self.group);

        let projects: Vec<ProjectInfo> = self
            .client
            .get_paginated(projects_url, &self.headers)
            .await?;

        let candidates = projects
            .into_iter()
            .filter(|project| is_indi_project(&project.name))
            .map(|project| Candidate::new(project.name, project.id.to_string()))
            .collect::<Vec<_>>();

        info!("found {} INDI packaging projects", candidates.len());

        Ok(candidates)
    }

    async fn changelog_locations(
        &self,
        candidate: &Candidate,
    ) -> Vec<ChangelogLocation> {
        let default_branch = self.get_default_branch(&candidate.id).await;

        branch_order(&default_branch)
            .into_iter()
            .flat_map(|branch| {
                GITLAB_CHANGELOG_PATHS.iter().map(move |path| {
                    ChangelogLocation::on_branch(branch.clone(), *path)
                })
            })
            .collect()
    }

    async fn fetch_file(
        &self,
        candidate: &Candidate,
        location: &ChangelogLocation,
    ) -> Result<Option<String>> {
        let mut file_url = self.base_url.join(&format!(
            "projects/{}/repository/files/{}/raw",
            candidate.id,
            urlencoding::encode(&location.path)
        ))?;

        if let Some(branch) = &location.branch {
            file_url.query_pairs_mut().append_pair("ref", branch);
        }

        let response = self.client.get(&file_url, &self.headers).await?;
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
        let mut commits_url = self.base_url.join(&format!(
            "projects/{}/repository/commits",
            candidate.id
        ))?;

        if let Some(branch) = &location.branch {
            commits_url.query_pairs_mut().append_pair("ref_name", branch);
        }
        commits_url.query_pairs_mut().append_pair("per_page", "1");

        let response = self.client.get(&commits_url, &self.headers).await?;
        if response.is_not_found() {
            return Ok(None);
        }

        let commits: Vec<GitlabCommit> =
            response.error_for_status(&commits_url)?.json()?;

        Ok(commits.into_iter().next().map(|commit| {
            CommitInfo::from_rfc3339(
                commit.id,
                commit.committed_date.as_deref(),
            )
        }))
    }
}
