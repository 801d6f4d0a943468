//! Drives one host from listing to finished records.
use futures_util::{StreamExt, stream};
use log::*;
use std::sync::Arc;

use crate::{
    changelog::{UNKNOWN_VERSION, extract_version, fetch_changelog},
    error::Result,
    forge::{traits::PackageSource, types::Candidate},
    ignore::IgnoreSet,
    record::{ChangelogStatus, PackageRecord},
};

/// Lists a host's candidates, drops ignored ones and processes the rest with
/// at most `concurrency` candidates in flight.
pub struct Scanner {
    source: Arc<dyn PackageSource>,
    ignore: IgnoreSet,
    concurrency: usize,
}

impl Scanner {
    pub fn new(
        source: Arc<dyn PackageSource>,
        ignore: IgnoreSet,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            ignore,
            concurrency: concurrency.max(1),
        }
    }

    /// One record per non-ignored candidate. Only a listing failure is an
    /// error; per-candidate problems degrade the record instead.
    ///
    /// With `concurrency > 1` records arrive in completion order.
    pub async fn scan(&self) -> Result<Vec<PackageRecord>> {
        let host = self.source.kind();

        let candidates = self.source.list_candidates().await?;
        let total = candidates.len();
        let candidates = self.ignore.filter(candidates);

        info!(
            "{host}: processing {} of {total} candidates ({} ignored)",
            candidates.len(),
            total - candidates.len()
        );

        let records = stream::iter(candidates)
            .map(|candidate| {
                let source = Arc::clone(&self.source);
                async move {
                    process_candidate(source.as_ref(), &candidate).await
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(records)
    }
}

/// Changelog, version and commit lookup for a single candidate. Never fails.
pub async fn process_candidate(
    source: &dyn PackageSource,
    candidate: &Candidate,
) -> PackageRecord {
    let host = source.kind();
    debug!("{host}: processing {}", candidate.name);

    let document = match fetch_changelog(source, candidate).await {
        Ok(Some(document)) => document,
        Ok(None) => {
            warn!("{host}: no changelog found for {}", candidate.name);
            return PackageRecord::unknown(
                host,
                &candidate.name,
                ChangelogStatus::NotFound,
            );
        }
        Err(err) => {
            error!(
                "{host}: error fetching changelog for {}: {err}",
                candidate.name
            );
            return PackageRecord::unknown(
                host,
                &candidate.name,
                ChangelogStatus::Failed,
            );
        }
    };

    let version = extract_version(&document.content);
    if version == UNKNOWN_VERSION {
        warn!(
            "{host}: no version header in changelog for {} at {}",
            candidate.name, document.location
        );
    }

    let commit = match source.latest_commit(candidate, &document.location).await
    {
        Ok(commit) => commit,
        Err(err) => {
            error!(
                "{host}: error fetching latest commit for {}: {err}",
                candidate.name
            );
            None
        }
    };

    PackageRecord::found(
        host,
        &candidate.name,
        version,
        document.location,
        commit,
    )
}
