//! Optional list of package names to skip.
use log::*;
use regex::Regex;
use std::{collections::HashSet, fs, path::Path, sync::LazyLock};

static SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").unwrap());

/// Names excluded from a run. Matching is exact and case-sensitive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    names: HashSet<String>,
}

impl IgnoreSet {
    /// Parses ignore-list contents. Each line may hold several names
    /// separated by commas or whitespace; `#` starts a comment.
    pub fn parse(contents: &str) -> Self {
        let names = contents
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .flat_map(|line| SEPARATOR_REGEX.split(line))
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Sorted names, for logging.
    pub fn names(&self) -> Vec<&str> {
        let mut names =
            self.names.iter().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Drops ignored candidates, keeping the relative order of the rest.
    pub fn filter<T: AsRef<str>>(&self, candidates: Vec<T>) -> Vec<T> {
        candidates
            .into_iter()
            .filter(|candidate| {
                let name = candidate.as_ref();
                if self.contains(name) {
                    debug!("ignoring {name}");
                    return false;
                }
                true
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Loads an ignore file. A missing or unreadable file yields an empty set.
pub fn parse_ignore_file(path: &Path) -> IgnoreSet {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let set = IgnoreSet::parse(&contents);
            info!(
                "using ignore list from {}: {:?}",
                path.display(),
                set.names()
            );
            set
        }
        Err(err) => {
            warn!(
                "unable to read ignore file {}: {err}: continuing without it",
                path.display()
            );
            IgnoreSet::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_skips_blank_lines_whitespace_and_comments() {
        let set = IgnoreSet::parse("foo\n\nbar  \n# comment\n");

        assert_eq!(set, IgnoreSet::from_iter(["foo", "bar"]));
    }

    #[test]
    fn parse_handles_trailing_comments_and_separators() {
        let set = IgnoreSet::parse(
            "indi-asu, indi-ahp-xc # broken upstream\n   \tlibqhy libasi\n",
        );

        assert_eq!(
            set.names(),
            vec!["indi-ahp-xc", "indi-asu", "libasi", "libqhy"]
        );
    }

    #[test]
    fn parse_ignore_file_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"indi-eqmod\n# indi-gphoto\nindi-qsi\n").unwrap();
        file.flush().unwrap();

        let set = parse_ignore_file(file.path());

        assert_eq!(set.len(), 2);
        assert!(set.contains("indi-eqmod"));
        assert!(set.contains("indi-qsi"));
        assert!(!set.contains("indi-gphoto"));
    }

    #[test]
    fn missing_ignore_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let set = parse_ignore_file(&dir.path().join("does-not-exist"));
        assert!(set.is_empty());
    }

    #[test]
    fn filter_preserves_order() {
        let ignore = IgnoreSet::from_iter(["b"]);
        let result = ignore.filter(vec!["a", "b", "c"]);
        assert_eq!(result, vec!["a", "c"]);
    }

    #[test]
    fn filter_is_case_sensitive_and_exact() {
        let ignore = IgnoreSet::from_iter(["indi-asi"]);
        let result =
            ignore.filter(vec!["INDI-ASI", "indi-asi", "indi-asi-power"]);
        assert_eq!(result, vec!["INDI-ASI", "indi-asi-power"]);
    }
}
