use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Version reported when no changelog header could be parsed.
pub const UNKNOWN_VERSION: &str = "Unknown";

// package (version) distribution(s); key=value, ...
static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r"^(?<package>[A-Za-z0-9][A-Za-z0-9+.\-]*)",
            r"\s+\((?<version>[^()\s]+)\)",
            r"(?:\s+(?<distributions>[^;]+?))?",
            r"\s*(?:;\s*(?<metadata>.*))?$",
        ),
    )
    .unwrap()
});

static URGENCY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\burgency=(?<urgency>[\w\-]+)").unwrap()
});

/// The first line of a Debian changelog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogHeader {
    pub package: String,
    pub version: String,
    pub distributions: Vec<String>,
    pub urgency: Option<String>,
}

/// Parses a changelog entry header. Indented lines never match.
pub fn parse_header(line: &str) -> Option<ChangelogHeader> {
    let caps = HEADER_REGEX.captures(line.trim_end())?;

    let distributions = caps
        .name("distributions")
        .map(|d| d.as_str().split_whitespace().map(String::from).collect())
        .unwrap_or_default();

    let urgency = caps.name("metadata").and_then(|m| {
        URGENCY_REGEX
            .captures(m.as_str())
            .map(|u| u["urgency"].to_string())
    });

    Some(ChangelogHeader {
        package: caps["package"].to_string(),
        version: caps["version"].to_string(),
        distributions,
        urgency,
    })
}

/// Version of the first entry in a changelog, verbatim, or
/// [`UNKNOWN_VERSION`].
pub fn extract_version(content: &str) -> String {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .find_map(parse_header)
        .map(|header| header.version)
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
