//! Configuration for upstream host connections.
use reqwest::{
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::{fmt, sync::Arc, time::Duration};

use crate::{
    error::{CensusError, Result},
    forge::{github::Github, gitlab::Gitlab, traits::PackageSource},
    http::{
        client::{RateLimitedClient, RetryPolicy},
        clock::SystemClock,
        transport::{DEFAULT_TIMEOUT, ReqwestTransport},
    },
};

/// GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";
/// Owner of the third-party driver monorepo.
pub const GITHUB_OWNER: &str = "indilib";
/// Third-party driver monorepo.
pub const GITHUB_REPO: &str = "indi-3rdparty";
/// Top-level directories of the monorepo that are not drivers.
pub const GITHUB_NON_DRIVER_DIRS: &[&str] = &[
    ".circleci",
    ".github",
    "cmake_modules",
    "debian",
    "examples",
    "scripts",
    "spec",
    "obsolete",
];

/// Salsa (Debian GitLab) API root.
pub const GITLAB_API_URL: &str = "https://salsa.debian.org/api/v4";
/// Group holding the Debian astronomy packaging.
pub const GITLAB_GROUP: &str = "debian-astro-team";
/// Project name prefixes that identify INDI related packaging.
pub const GITLAB_NAME_PREFIXES: &[&str] = &["indi-", "lib"];
/// Projects that match the prefixes but are not INDI drivers.
pub const GITLAB_EXCLUDED_PROJECTS: &[&str] = &["indi-asu", "indi-ahp-xc"];
/// Branch preferred by Debian packaging repositories.
pub const GITLAB_PACKAGING_BRANCH: &str = "debian/main";
/// Guess used when the default branch cannot be resolved.
pub const DEFAULT_BRANCH_GUESS: &str = "master";
/// Where packaging repositories keep their changelog, in priority order.
pub const GITLAB_CHANGELOG_PATHS: &[&str] = &[
    "debian/changelog",
    "packaging/debian/changelog",
    "debian.upstream/changelog",
    "orig/debian/changelog",
];

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: u8 = 100;

/// Supported upstream hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    Github,
    Gitlab,
}

impl HostKind {
    pub fn name(&self) -> &'static str {
        match self {
            HostKind::Github => "github",
            HostKind::Gitlab => "gitlab",
        }
    }

    pub fn token_env_var(&self) -> &'static str {
        match self {
            HostKind::Github => "GITHUB_TOKEN",
            HostKind::Gitlab => "GITLAB_TOKEN",
        }
    }

    pub fn default_api_url(&self) -> &'static str {
        match self {
            HostKind::Github => GITHUB_API_URL,
            HostKind::Gitlab => GITLAB_API_URL,
        }
    }

    /// GitHub is walked one driver at a time; Salsa tolerates more.
    pub fn default_concurrency(&self) -> usize {
        match self {
            HostKind::Github => 1,
            HostKind::Gitlab => 8,
        }
    }

    /// Length of the abbreviated sha in snapshot versions.
    pub fn short_sha_len(&self) -> usize {
        match self {
            HostKind::Github => 7,
            HostKind::Gitlab => 8,
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection settings for one host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub kind: HostKind,
    /// API root. Always ends with a slash so relative joins append.
    pub api_url: Url,
    /// Access token. `None` queries the host anonymously.
    pub token: Option<SecretString>,
    pub timeout: Duration,
    pub concurrency: usize,
    pub retry_policy: RetryPolicy,
}

impl HostConfig {
    pub fn new(kind: HostKind, api_url: &str) -> Result<Self> {
        Ok(Self {
            kind,
            api_url: parse_api_url(api_url)?,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            concurrency: kind.default_concurrency(),
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    /// Credential headers sent on every request.
    pub fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let Some(token) = &self.token else {
            return Ok(headers);
        };

        let token = token.expose_secret();

        match self.kind {
            HostKind::Github => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {token}"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            HostKind::Gitlab => {
                let mut value = HeaderValue::from_str(token)?;
                value.set_sensitive(true);
                headers.insert("private-token", value);
            }
        }

        Ok(headers)
    }

    /// Builds the rate-limited client for this host.
    pub fn client(&self) -> Result<RateLimitedClient> {
        let transport = ReqwestTransport::new(self.timeout)?;
        Ok(RateLimitedClient::new(
            Box::new(transport),
            Arc::new(SystemClock),
            self.retry_policy.clone(),
        ))
    }
}

fn parse_api_url(api_url: &str) -> Result<Url> {
    let trimmed = api_url.trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/"))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CensusError::invalid_config(format!(
            "unsupported scheme {other} for api url {api_url}: \
             use http or https"
        ))),
    }
}

#[derive(Debug, Clone)]
/// Configured upstream hosts.
pub enum Host {
    Github(HostConfig),
    Gitlab(HostConfig),
}

impl Host {
    pub fn config(&self) -> &HostConfig {
        match self {
            Host::Github(config) | Host::Gitlab(config) => config,
        }
    }

    /// Create the package source for the configured host.
    pub fn get_source(&self) -> Result<Arc<dyn PackageSource>> {
        match self {
            Host::Github(config) => {
                let source = Github::new(config.clone())?;
                Ok(Arc::new(source))
            }
            Host::Gitlab(config) => {
                let source = Gitlab::new(config.clone())?;
                Ok(Arc::new(source))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_gets_trailing_slash() {
        let config = HostConfig::new(HostKind::Gitlab, GITLAB_API_URL).unwrap();
        assert_eq!(config.api_url.as_str(), "https://salsa.debian.org/api/v4/");

        let config =
            HostConfig::new(HostKind::Github, "https://api.github.com/")
                .unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.github.com/");
    }

    #[test]
    fn api_url_rejects_other_schemes() {
        let err = HostConfig::new(HostKind::Github, "ftp://example.com")
            .unwrap_err();
        assert!(matches!(err, CensusError::InvalidConfig(_)));
    }

    #[test]
    fn github_uses_bearer_token() {
        let config = HostConfig::new(HostKind::Github, GITHUB_API_URL)
            .unwrap()
            .with_token(Some(SecretString::from("gh-secret".to_string())));

        let headers = config.auth_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer gh-secret");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn gitlab_uses_private_token_header() {
        let config = HostConfig::new(HostKind::Gitlab, GITLAB_API_URL)
            .unwrap()
            .with_token(Some(SecretString::from("gl-secret".to_string())));

        let headers = config.auth_headers().unwrap();
        assert_eq!(headers["private-token"], "gl-secret");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn anonymous_config_sends_no_credentials() {
        let config = HostConfig::new(HostKind::Github, GITHUB_API_URL).unwrap();
        assert!(config.auth_headers().unwrap().is_empty());
    }

    #[test]
    fn host_defaults() {
        assert_eq!(HostKind::Github.default_concurrency(), 1);
        assert_eq!(HostKind::Gitlab.short_sha_len(), 8);
        assert_eq!(HostKind::Gitlab.to_string(), "gitlab");
    }
}
