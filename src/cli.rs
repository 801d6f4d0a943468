//! CLI argument parsing and host configuration.
use clap::{Parser, ValueEnum};
use secrecy::SecretString;
use std::{env, path::PathBuf, time::Duration};

use crate::{
    error::{CensusError, Result},
    forge::config::{
        GITHUB_API_URL, GITLAB_API_URL, Host, HostConfig, HostKind,
    },
    report::OutputFormat,
};

/// Hosts to scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HostSelection {
    Github,
    Gitlab,
    #[default]
    All,
}

impl HostSelection {
    pub fn kinds(&self) -> Vec<HostKind> {
        match self {
            HostSelection::Github => vec![HostKind::Github],
            HostSelection::Gitlab => vec![HostKind::Gitlab],
            HostSelection::All => vec![HostKind::Github, HostKind::Gitlab],
        }
    }
}

/// Report the Debian packaging version of every INDI driver.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File listing package names to skip, separated by commas or
    /// whitespace. `#` starts a comment.
    pub ignore_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = HostSelection::All)]
    /// Hosts to scan.
    pub host: HostSelection,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    /// Output format.
    pub format: OutputFormat,

    #[arg(long, default_value_t = false)]
    /// Sort records by package name.
    pub sort: bool,

    #[arg(long)]
    /// Packages processed in parallel per host. Defaults to 1 for GitHub and
    /// 8 for GitLab.
    pub concurrency: Option<usize>,

    #[arg(long, default_value = "")]
    /// GitHub personal access token. Falls back to GITHUB_TOKEN env var.
    pub github_token: String,

    #[arg(long, default_value = "")]
    /// GitLab personal access token. Falls back to GITLAB_TOKEN env var.
    pub gitlab_token: String,

    #[arg(long, default_value = GITHUB_API_URL)]
    /// GitHub API root.
    pub github_api_url: String,

    #[arg(long, default_value = GITLAB_API_URL)]
    /// GitLab API root.
    pub gitlab_api_url: String,

    #[arg(long, default_value_t = false)]
    /// Query hosts without a token when none is configured.
    pub allow_anonymous: bool,

    #[arg(long, default_value_t = 10)]
    /// Per-request timeout in seconds.
    pub timeout: u64,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging.
    pub debug: bool,
}

impl Args {
    /// Configure every selected host from CLI arguments and environment.
    pub fn get_hosts(&self) -> Result<Vec<Host>> {
        if self.concurrency == Some(0) {
            return Err(CensusError::InvalidArgs(
                "--concurrency must be at least 1".into(),
            ));
        }

        if self.timeout == 0 {
            return Err(CensusError::InvalidArgs(
                "--timeout must be at least 1 second".into(),
            ));
        }

        self.host
            .kinds()
            .into_iter()
            .map(|kind| self.get_host(kind))
            .collect()
    }

    fn get_host(&self, kind: HostKind) -> Result<Host> {
        let (api_url, flag_token) = match kind {
            HostKind::Github => (&self.github_api_url, &self.github_token),
            HostKind::Gitlab => (&self.gitlab_api_url, &self.gitlab_token),
        };

        let token = resolve_token(
            kind,
            flag_token,
            env::var(kind.token_env_var()).ok(),
            self.allow_anonymous,
        )?;

        let mut config = HostConfig::new(kind, api_url)?.with_token(token);
        config.timeout = Duration::from_secs(self.timeout);

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }

        Ok(match kind {
            HostKind::Github => Host::Github(config),
            HostKind::Gitlab => Host::Gitlab(config),
        })
    }
}

/// Picks the flag token, then the env token. Without either the host is only
/// usable anonymously.
fn resolve_token(
    kind: HostKind,
    flag_token: &str,
    env_token: Option<String>,
    allow_anonymous: bool,
) -> Result<Option<SecretString>> {
    let mut token = flag_token.trim().to_string();

    if token.is_empty()
        && let Some(env_token) = env_token
    {
        token = env_token.trim().to_string();
    }

    if !token.is_empty() {
        return Ok(Some(SecretString::from(token)));
    }

    if allow_anonymous {
        log::warn!("no token for {kind}: querying anonymously");
        return Ok(None);
    }

    Err(CensusError::missing_token(kind.name(), kind.token_env_var()))
}
