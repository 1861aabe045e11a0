//! Fixture discovery.
//!
//! Walks the fixture tree once, collects each directory's files in sorted order and pairs every source file with the
//! query file its [`Convention`] names. Directories are visited pre-order with siblings sorted by name, so the
//! same tree always yields the same pairs in the same order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use systest_core::Convention;
use walkdir::WalkDir;

use crate::errors::HarnessError;

/// A source fixture, its query companion and the output log they produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePair {
    /// Directory holding both files, relative to the working root when possible
    pub directory: PathBuf,
    pub source_file: String,
    pub query_file: String,
    /// Key shared by the pair
    pub prefix: String,
    /// File name of the output log, inside `directory`
    pub output_file: String,
}

impl FixturePair {
    pub fn source_path(&self) -> PathBuf {
        self.directory.join(&self.source_file)
    }

    pub fn query_path(&self) -> PathBuf {
        self.directory.join(&self.query_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.directory.join(&self.output_file)
    }
}

/// All pairs found in one directory, in sorted file-name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    pub directory: PathBuf,
    pub pairs: Vec<FixturePair>,
}

/// Discovery result: directory groups in walk order plus the source files left unpaired.
#[derive(Debug, Clone, Default)]
pub struct FixtureIndex {
    groups: Vec<DirectoryGroup>,
    unmatched: Vec<PathBuf>,
}

impl FixtureIndex {
    pub fn groups(&self) -> &[DirectoryGroup] {
        &self.groups
    }

    /// Every pair, grouped by directory, in processing order.
    pub fn pairs(&self) -> impl Iterator<Item = &FixturePair> {
        self.groups.iter().flat_map(|g| g.pairs.iter())
    }

    /// Source files whose query companion is missing.
    pub fn unmatched(&self) -> &[PathBuf] {
        &self.unmatched
    }

    /// Pairs registered for `directory`, if any.
    pub fn get(&self, directory: &Path) -> Option<&[FixturePair]> {
        self.groups
            .iter()
            .find(|g| g.directory == directory)
            .map(|g| g.pairs.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.pairs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pairs fixtures under one naming convention.
#[derive(Debug, Clone)]
pub struct FixtureDiscoverer {
    convention: Convention,
}

impl FixtureDiscoverer {
    pub fn new(convention: Convention) -> Self {
        Self { convention }
    }

    /// Discover fixture pairs below `root`.
    ///
    /// Directory keys have `base` stripped from their front; directories outside `base` keep their full path.
    /// A source file without its companion is skipped with a diagnostic on stdout.
    ///
    /// ## Errors
    ///
    /// Fails if the tree cannot be walked, including when a directory cannot be listed.
    #[tracing::instrument(skip_all, fields(root = %root.display()))]
    pub fn discover(&self, root: &Path, base: &Path) -> Result<FixtureIndex, HarnessError> {
        // Directories in pre-order, each with its files; siblings arrive sorted by name
        let mut listings: Vec<(PathBuf, Vec<String>)> = Vec::new();
        let mut slot_of: HashMap<PathBuf, usize> = HashMap::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| HarnessError::Discovery {
                root: root.to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                slot_of.insert(path.to_path_buf(), listings.len());
                listings.push((path.to_path_buf(), Vec::new()));
                continue;
            }
            if !path.is_file() {
                continue;
            }
            let slot = path.parent().and_then(|parent| slot_of.get(parent));
            // Non-UTF-8 names cannot match a convention.
            if let (Some(&slot), Some(name)) = (slot, entry.file_name().to_str()) {
                listings[slot].1.push(name.to_string());
            }
        }

        let mut index = FixtureIndex::default();
        for (dir, file_names) in listings {
            let key = dir.strip_prefix(base).unwrap_or(&dir).to_path_buf();
            let pairs = self.pair_directory(&key, &file_names, &mut index.unmatched);
            if !pairs.is_empty() {
                index.groups.push(DirectoryGroup { directory: key, pairs });
            }
        }

        tracing::debug!(
            pairs = index.len(),
            unmatched = index.unmatched.len(),
            "fixture discovery finished"
        );
        Ok(index)
    }

    /// Pair the (sorted) files of a single directory.
    fn pair_directory(&self, directory: &Path, file_names: &[String], unmatched: &mut Vec<PathBuf>) -> Vec<FixturePair> {
        let present: HashSet<&str> = file_names.iter().map(String::as_str).collect();
        let mut pairs = Vec::new();

        for name in file_names {
            let Some(m) = self.convention.match_source(name) else {
                continue;
            };
            tracing::debug!(source = %name, "source fixture candidate");

            if !present.contains(m.query_file.as_str()) {
                println!("Unable to find matching queries for: {}", name);
                tracing::warn!(source = %name, expected = %m.query_file, "unmatched source fixture");
                unmatched.push(directory.join(name));
                continue;
            }

            pairs.push(FixturePair {
                directory: directory.to_path_buf(),
                source_file: name.clone(),
                query_file: m.query_file,
                output_file: self.convention.output_file_name(&m.prefix),
                prefix: m.prefix,
            });
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use systest_core::PairingRule;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pair_directory_matches_by_prefix() {
        let discoverer = FixtureDiscoverer::new(Convention::default());
        let mut unmatched = Vec::new();
        let files = names(&[
            "iter1_queries.txt",
            "iter1_source.txt",
            "iter2_queries.txt",
            "iter2_source.txt",
        ]);
        let pairs = discoverer.pair_directory(Path::new("t"), &files, &mut unmatched);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source_file, "iter1_source.txt");
        assert_eq!(pairs[0].query_file, "iter1_queries.txt");
        assert_eq!(pairs[0].output_path(), PathBuf::from("t/iter1_out.txt"));
        assert_eq!(pairs[1].prefix, "iter2");
        assert!(unmatched.is_empty());
    }

    #[test]
    fn test_pair_directory_never_borrows_another_query() {
        let discoverer = FixtureDiscoverer::new(Convention::default());
        let mut unmatched = Vec::new();
        let files = names(&["iter1_source.txt", "iter2_queries.txt"]);
        let pairs = discoverer.pair_directory(Path::new("t"), &files, &mut unmatched);

        assert!(pairs.is_empty());
        assert_eq!(unmatched, vec![PathBuf::from("t/iter1_source.txt")]);
    }

    #[test]
    fn test_pair_directory_prefixed() {
        let discoverer = FixtureDiscoverer::new(Convention::new(PairingRule::Prefixed));
        let mut unmatched = Vec::new();
        let files = names(&["queries_calls.txt", "source_calls.txt", "source_next.txt"]);
        let pairs = discoverer.pair_directory(Path::new(""), &files, &mut unmatched);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].query_path(), PathBuf::from("queries_calls.txt"));
        assert_eq!(pairs[0].output_file, "calls_out.txt");
        assert_eq!(unmatched, vec![PathBuf::from("source_next.txt")]);
    }

    #[test]
    fn test_index_accessors() {
        let pair = FixturePair {
            directory: PathBuf::from("a"),
            source_file: "iter1_source.txt".into(),
            query_file: "iter1_queries.txt".into(),
            prefix: "iter1".into(),
            output_file: "iter1_out.txt".into(),
        };
        let index = FixtureIndex {
            groups: vec![DirectoryGroup {
                directory: PathBuf::from("a"),
                pairs: vec![pair.clone()],
            }],
            unmatched: Vec::new(),
        };
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
        assert_eq!(index.get(Path::new("a")), Some(&[pair][..]));
        assert!(index.get(Path::new("b")).is_none());
    }
}
