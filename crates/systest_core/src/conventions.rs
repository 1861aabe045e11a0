//! Fixture naming conventions.
//!
//! A convention decides which file names are "source" fixtures and what the companion "queries" file of each one
//! must be called. Both files live in the same directory and share a prefix, which also names the output log.

/// Tag that source files start with when no tag is given on the command line.
pub const DEFAULT_TAG: &str = "iter";

/// Suffix of source files under [`PairingRule::Tagged`].
pub const SOURCE_SUFFIX: &str = "_source.txt";

/// Suffix of query files under [`PairingRule::Tagged`].
pub const QUERIES_SUFFIX: &str = "_queries.txt";

/// Prefix of source files under [`PairingRule::Prefixed`].
pub const SOURCE_PREFIX: &str = "source_";

/// Prefix of query files under [`PairingRule::Prefixed`].
pub const QUERIES_PREFIX: &str = "queries_";

/// Suffix appended to a fixture prefix to name its output log.
pub const OUTPUT_SUFFIX: &str = "_out.txt";

/// How a source file name maps to its query file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingRule {
    /// `<tag>…_source.txt` pairs with `<tag>…_queries.txt`.
    #[default]
    Tagged,
    /// `source_<stem>` pairs with `queries_<stem>`.
    Prefixed,
}

impl PairingRule {
    /// Parse a rule from its command-line spelling.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "tagged" => Some(PairingRule::Tagged),
            "prefixed" => Some(PairingRule::Prefixed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PairingRule::Tagged => "tagged",
            PairingRule::Prefixed => "prefixed",
        }
    }
}

/// A source file recognised by a [`Convention`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMatch {
    /// File name the companion query file must have.
    pub query_file: String,
    /// Key shared by the pair; names the output log.
    pub prefix: String,
}

/// The active naming convention plus the report detail it implies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Convention {
    pub rule: PairingRule,
    /// Restricts source files to names (or stems, for [`PairingRule::Prefixed`]) starting with this tag.
    pub tag: Option<String>,
    /// Report expected-case and completed-run counts for every fixture.
    pub count_cases: bool,
}

impl Convention {
    pub fn new(rule: PairingRule) -> Self {
        Self {
            rule,
            tag: None,
            count_cases: false,
        }
    }

    /// Set the source-file tag filter.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Enable expected/completed case counts in the report.
    pub fn with_case_counting(mut self, count_cases: bool) -> Self {
        self.count_cases = count_cases;
        self
    }

    /// The tag actually applied when matching source files.
    ///
    /// The tagged rule always filters (falling back to [`DEFAULT_TAG`]); the prefixed rule only filters when a tag
    /// was given explicitly.
    pub fn effective_tag(&self) -> Option<&str> {
        match self.rule {
            PairingRule::Tagged => Some(self.tag.as_deref().unwrap_or(DEFAULT_TAG)),
            PairingRule::Prefixed => self.tag.as_deref(),
        }
    }

    /// Decide whether `file_name` is a source fixture and, if so, derive its companion.
    ///
    /// ## Returns
    /// - `Some(SourceMatch)` for a source file, whether or not the companion exists on disk.
    /// - `None` for every other file.
    pub fn match_source(&self, file_name: &str) -> Option<SourceMatch> {
        match self.rule {
            PairingRule::Tagged => {
                let tag = self.effective_tag().unwrap_or(DEFAULT_TAG);
                if !file_name.starts_with(tag) {
                    return None;
                }
                let prefix = file_name.strip_suffix(SOURCE_SUFFIX)?;
                Some(SourceMatch {
                    query_file: format!("{prefix}{QUERIES_SUFFIX}"),
                    prefix: prefix.to_string(),
                })
            }
            PairingRule::Prefixed => {
                let stem = file_name.strip_prefix(SOURCE_PREFIX)?;
                if stem.is_empty() {
                    return None;
                }
                if let Some(tag) = self.effective_tag() {
                    if !stem.starts_with(tag) {
                        return None;
                    }
                }
                let prefix = match stem.rsplit_once('.') {
                    Some((base, _)) if !base.is_empty() => base,
                    _ => stem,
                };
                Some(SourceMatch {
                    query_file: format!("{QUERIES_PREFIX}{stem}"),
                    prefix: prefix.to_string(),
                })
            }
        }
    }

    /// Output log file name for a fixture prefix.
    pub fn output_file_name(&self, prefix: &str) -> String {
        format!("{prefix}{OUTPUT_SUFFIX}")
    }
}
