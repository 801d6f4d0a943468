use log::*;

use crate::{
    error::{CensusError, Result},
    forge::{
        traits::PackageSource,
        types::{Candidate, ChangelogDocument, ChangelogLocation},
    },
};

/// Walks `locations` in order and returns the first changelog found.
///
/// A missing file moves on to the next location. So does a failed request,
/// after it is logged. Once the chain is exhausted the result is `Ok(None)`
/// if every location was simply missing, or the last error if any request
/// failed.
pub async fn resolve_changelog(
    source: &dyn PackageSource,
    candidate: &Candidate,
    locations: &[ChangelogLocation],
) -> Result<Option<ChangelogDocument>> {
    let mut last_error: Option<CensusError> = None;

    for location in locations {
        debug!("{}: looking for changelog at {location}", candidate.name);

        match source.fetch_file(candidate, location).await {
            Ok(Some(content)) => {
                debug!("{}: found changelog at {location}", candidate.name);
                return Ok(Some(ChangelogDocument {
                    content,
                    location: location.clone(),
                }));
            }
            Ok(None) => continue,
            Err(err) => {
                warn!(
                    "{}: failed to fetch changelog at {location}: {err}",
                    candidate.name
                );
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(None),
    }
}

/// Builds the host's fallback chain for `candidate` and resolves it.
pub async fn fetch_changelog(
    source: &dyn PackageSource,
    candidate: &Candidate,
) -> Result<Option<ChangelogDocument>> {
    let locations = source.changelog_locations(candidate).await;
    resolve_changelog(source, candidate, &locations).await
}
