//! Result-log grammar.
//!
//! The external analyzer writes one record per test case. The line holding a case's identifier ends the id with
//! a `</id>` closing tag, and a fixed number of lines later the record carries either a passing marker or a line
//! consisting of exactly `<failed>`. Query files declare each case in a fixed-size block of lines.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Closing tag that terminates a case identifier.
pub const ID_CLOSE_TAG: &str = "</id>";

/// Line that marks a failed case.
pub const FAILED_MARKER: &str = "<failed>";

/// ASCII digits immediately before `</id>`. An empty capture means the tag is not preceded by a digit.
static CASE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"([0-9]*){}", regex::escape(ID_CLOSE_TAG)))
        .expect("INVARIANT: case-id pattern is a valid regex")
});

/// Fixed record layout of result logs and query files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLayout {
    /// Lines between a case's `</id>` line and its `<failed>` marker.
    pub failed_lookback: usize,
    /// Lines each declared case occupies in a query file.
    pub query_block_lines: usize,
}

impl Default for LogLayout {
    fn default() -> Self {
        Self {
            failed_lookback: 4,
            query_block_lines: 5,
        }
    }
}

/// A result log that does not follow the expected record layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogFormatError {
    #[error("line {line}: `</id>` is not preceded by a case identifier")]
    MissingCaseId { line: usize },

    #[error("line {line}: case identifier `{digits}` does not fit in 64 bits")]
    CaseIdOverflow { line: usize, digits: String },

    #[error("line {marker_line}: `<failed>` marker has no record {lookback} lines above it")]
    MarkerWithoutRecord { marker_line: usize, lookback: usize },

    #[error("line {marker_line}: `<failed>` marker points at line {id_line}, which has no `</id>` tag")]
    MarkerWithoutId { marker_line: usize, id_line: usize },
}

/// Outcome of one fixture's result log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResult {
    /// Cases declared by the query file, when the convention reports it.
    pub expected_case_count: Option<usize>,
    /// Largest case id seen anywhere in the log, 0 for a log without ids.
    pub highest_completed_id: u64,
    /// Failed case ids in the order their markers appear.
    pub failed_ids: Vec<u64>,
}

impl ParsedResult {
    pub fn failed_count(&self) -> usize {
        self.failed_ids.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_ids.is_empty()
    }
}

/// Extract the case identifier from a single log line.
///
/// ## Parameters
/// - `line`: the log line, without its terminator.
/// - `line_no`: 1-based line number used in errors.
///
/// ## Returns
/// - `Ok(None)` when the line has no `</id>` tag.
/// - `Ok(Some(id))` for the digits directly in front of the first `</id>`.
/// - `Err(_)` when the tag is not preceded by digits or the id overflows.
pub fn extract_case_id(line: &str, line_no: usize) -> Result<Option<u64>, LogFormatError> {
    let Some(caps) = CASE_ID.captures(line) else {
        return Ok(None);
    };
    let digits = caps.get(1).map_or("", |m| m.as_str());
    if digits.is_empty() {
        return Err(LogFormatError::MissingCaseId { line: line_no });
    }
    digits
        .parse::<u64>()
        .map(Some)
        .map_err(|_| LogFormatError::CaseIdOverflow {
            line: line_no,
            digits: digits.to_string(),
        })
}

/// Number of cases a query file declares: its line count divided by the block size.
pub fn expected_case_count(query_text: &str, layout: &LogLayout) -> usize {
    if layout.query_block_lines == 0 {
        return 0;
    }
    query_text.lines().count() / layout.query_block_lines
}

/// Parse a result log.
///
/// ## Parameters
/// - `log_text`: the full output log of one fixture.
/// - `query_text`: the fixture's query file, when expected-case counts are wanted.
/// - `layout`: record layout of logs and query files.
///
/// ## Errors
/// Returns [`LogFormatError`] for any `</id>` tag without a numeric id in front of it and for `<failed>` markers
/// whose lookback line is missing or carries no id.
pub fn parse_log(log_text: &str, query_text: Option<&str>, layout: &LogLayout) -> Result<ParsedResult, LogFormatError> {
    let lines: Vec<&str> = log_text.lines().collect();

    let mut highest_completed_id = 0;
    for (idx, line) in lines.iter().enumerate() {
        if let Some(id) = extract_case_id(line, idx + 1)? {
            highest_completed_id = highest_completed_id.max(id);
        }
    }

    let mut failed_ids = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if *line != FAILED_MARKER {
            continue;
        }
        let Some(id_idx) = idx.checked_sub(layout.failed_lookback) else {
            return Err(LogFormatError::MarkerWithoutRecord {
                marker_line: idx + 1,
                lookback: layout.failed_lookback,
            });
        };
        match extract_case_id(lines[id_idx], id_idx + 1)? {
            Some(id) => failed_ids.push(id),
            None => {
                return Err(LogFormatError::MarkerWithoutId {
                    marker_line: idx + 1,
                    id_line: id_idx + 1,
                });
            }
        }
    }

    Ok(ParsedResult {
        expected_case_count: query_text.map(|text| expected_case_count(text, layout)),
        highest_completed_id,
        failed_ids,
    })
}
