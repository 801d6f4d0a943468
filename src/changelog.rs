//! Debian changelog retrieval and parsing.
//!
//! Retrieval walks an ordered fallback chain of [`ChangelogLocation`]s
//! provided by each host, so hosts differ only in the chain they build.
//! Parsing pulls the version out of the first `name (version) dist;
//! urgency=level` header line.
//!
//! [`ChangelogLocation`]: crate::forge::types::ChangelogLocation

/// Generic fallback-chain resolver.
pub mod fetcher;

/// Changelog header parsing and version extraction.
pub mod version;

pub use fetcher::{fetch_changelog, resolve_changelog};
pub use version::{UNKNOWN_VERSION, extract_version, parse_header};
