//! Wording of the consolidated report.

use std::fmt::Write as _;

use crate::log::ParsedResult;

/// Summary line for a fixture without failed cases.
pub const ALL_PASSED_MSG: &str = "All test cases passed";

/// Summary line: either [`ALL_PASSED_MSG`] or the comma-joined failed ids.
pub fn summary_line(result: &ParsedResult) -> String {
    if result.all_passed() {
        return ALL_PASSED_MSG.to_string();
    }
    let ids: Vec<String> = result.failed_ids.iter().map(u64::to_string).collect();
    format!("Failed TCs: {}", ids.join(","))
}

pub fn failed_count_line(result: &ParsedResult) -> String {
    format!("Number of Failed TC: {}", result.failed_count())
}

pub fn expected_count_line(count: usize) -> String {
    format!("Number of Expected TC: {count}")
}

pub fn completed_count_line(highest_id: u64) -> String {
    format!("Number of Completed TC: {highest_id}")
}

/// One fixture's block in the report.
#[derive(Debug, Clone)]
pub struct ReportBlock<'a> {
    pub directory: &'a str,
    pub source_file: &'a str,
    pub queries_file: &'a str,
    pub result: &'a ParsedResult,
    /// Include the expected/completed count lines.
    pub count_cases: bool,
}

impl ReportBlock<'_> {
    /// Render the block, terminated by a blank separator line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Directory path: {}", self.directory);
        let _ = writeln!(out, "Source file: {}", self.source_file);
        let _ = writeln!(out, "Queries file: {}", self.queries_file);
        if self.count_cases {
            let _ = writeln!(out, "{}", expected_count_line(self.result.expected_case_count.unwrap_or(0)));
            let _ = writeln!(out, "{}", completed_count_line(self.result.highest_completed_id));
        }
        let _ = writeln!(out, "{}", summary_line(self.result));
        let _ = writeln!(out, "{}", failed_count_line(self.result));
        out.push('\n');
        out
    }
}
