//! Census command: scan every configured host and report the results.
use log::*;
use std::{io::Write, process::ExitCode, sync::Arc};

use crate::{
    cli::Args,
    error::{CensusError, Result},
    forge::{config::HostKind, traits::PackageSource},
    ignore::{IgnoreSet, parse_ignore_file},
    record::PackageRecord,
    report::{sort_records, write_records},
    scanner::Scanner,
};

/// Exit code for a fatal configuration error.
pub const EXIT_CONFIG_ERROR: u8 = 2;
/// Exit code when at least one host could not be listed.
pub const EXIT_HOST_FAILURE: u8 = 3;

/// Records produced by a run and the hosts that could not be listed.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub records: Vec<PackageRecord>,
    pub failed_hosts: Vec<HostKind>,
}

impl RunSummary {
    pub fn exit_code(&self) -> ExitCode {
        if self.failed_hosts.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(EXIT_HOST_FAILURE)
        }
    }
}

/// Execute the census and write records to `out`.
pub async fn execute<W: Write>(args: &Args, out: &mut W) -> Result<RunSummary> {
    let hosts = args.get_hosts().map_err(as_config_error)?;

    let ignore = match &args.ignore_file {
        Some(path) => parse_ignore_file(path),
        None => IgnoreSet::default(),
    };

    if !ignore.is_empty() {
        info!("ignoring {} packages", ignore.len());
    }

    let mut sources = vec![];
    for host in hosts.iter() {
        let source = host.get_source().map_err(as_config_error)?;
        sources.push((source, host.config().concurrency));
    }

    let mut summary = scan_sources(sources, &ignore).await;

    if args.sort {
        sort_records(&mut summary.records);
    }

    write_records(out, &summary.records, args.format)?;

    Ok(summary)
}

/// Scans each source in turn. A host whose listing fails is recorded and
/// skipped; the remaining hosts still run.
pub async fn scan_sources(
    sources: Vec<(Arc<dyn PackageSource>, usize)>,
    ignore: &IgnoreSet,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for (source, concurrency) in sources {
        let host = source.kind();
        let scanner = Scanner::new(source, ignore.clone(), concurrency);

        match scanner.scan().await {
            Ok(records) => {
                let known =
                    records.iter().filter(|r| r.has_known_version()).count();
                info!(
                    "{host}: {} packages scanned, {known} with a known version",
                    records.len()
                );
                summary.records.extend(records);
            }
            Err(err) => {
                error!("{host}: unable to list packages: {err}");
                summary.failed_hosts.push(host);
            }
        }
    }

    summary
}

/// Setup failures before any request is made are configuration errors.
fn as_config_error(err: CensusError) -> CensusError {
    if err.is_fatal_config() {
        return err;
    }
    CensusError::invalid_config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::{
        traits::MockPackageSource,
        types::{Candidate, ChangelogLocation},
    };
    use clap::Parser;

    fn source_with(
        kind: HostKind,
        names: &'static [&'static str],
    ) -> Arc<dyn PackageSource> {
        let mut source = MockPackageSource::new();
        source.expect_kind().returning(move || kind);
        source.expect_list_candidates().returning(move || {
            Ok(names.iter().map(|n| Candidate::new(*n, *n)).collect())
        });
        source.expect_changelog_locations().returning(|c| {
            vec![ChangelogLocation::on_default_branch(format!(
                "debian/{}/changelog",
                c.name
            ))]
        });
        source.expect_fetch_file().returning(|c, _| {
            Ok(Some(format!("{} (1.0-1) unstable; urgency=low", c.name)))
        });
        source.expect_latest_commit().returning(|_, _| Ok(None));
        Arc::new(source)
    }

    fn failing_source(kind: HostKind) -> Arc<dyn PackageSource> {
        let mut source = MockPackageSource::new();
        source.expect_kind().returning(move || kind);
        source
            .expect_list_candidates()
            .returning(|| Err(CensusError::network("connection refused")));
        Arc::new(source)
    }

    #[test_log::test(tokio::test)]
    async fn scans_every_host() {
        let summary = scan_sources(
            vec![
                (source_with(HostKind::Github, &["indi-asi", "indi-qhy"]), 1),
                (source_with(HostKind::Gitlab, &["libasi"]), 8),
            ],
            &IgnoreSet::default(),
        )
        .await;

        assert!(summary.failed_hosts.is_empty());
        assert_eq!(summary.records.len(), 3);
        assert_eq!(summary.exit_code(), ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn listing_failure_skips_host_but_not_others() {
        let summary = scan_sources(
            vec![
                (failing_source(HostKind::Github), 1),
                (source_with(HostKind::Gitlab, &["libasi", "indi-eqmod"]), 2),
            ],
            &IgnoreSet::default(),
        )
        .await;

        assert_eq!(summary.failed_hosts, vec![HostKind::Github]);
        assert_eq!(summary.records.len(), 2);
        assert_eq!(summary.exit_code(), ExitCode::from(EXIT_HOST_FAILURE));
    }

    #[tokio::test]
    async fn ignore_set_applies_to_every_host() {
        let summary = scan_sources(
            vec![
                (source_with(HostKind::Github, &["indi-asi", "indi-qhy"]), 1),
                (source_with(HostKind::Gitlab, &["indi-qhy", "libqhy"]), 1),
            ],
            &IgnoreSet::from_iter(["indi-qhy"]),
        )
        .await;

        let names = summary
            .records
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["indi-asi", "libqhy"]);
    }

    #[tokio::test]
    async fn bad_api_url_is_a_config_error() {
        let args = Args::parse_from([
            "indi-census",
            "--host",
            "github",
            "--github-token",
            "gh",
            "--github-api-url",
            "::nope::",
        ]);
        let mut out = Vec::new();

        let err = execute(&args, &mut out).await.unwrap_err();

        assert!(err.is_fatal_config());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_a_config_error() {
        let args = Args::parse_from([
            "indi-census",
            "--host",
            "gitlab",
            "--gitlab-api-url",
            "http://127.0.0.1:9/api/v4",
        ]);

        // only meaningful when the environment carries no token
        if std::env::var("GITLAB_TOKEN").is_ok() {
            return;
        }

        let mut out = Vec::new();
        let err = execute(&args, &mut out).await.unwrap_err();

        assert!(matches!(err, CensusError::MissingToken { .. }));
    }
}
