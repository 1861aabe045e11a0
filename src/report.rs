//! The consolidated report file.
//!
//! The writer is created once per run, truncating any previous report, and appends one block per processed
//! fixture. Each block is flushed as soon as it is written, so an aborted run keeps every block it finished.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use systest_core::ParsedResult;
use systest_core::report::ReportBlock;

use crate::discovery::FixturePair;
use crate::errors::HarnessError;

pub struct ReportWriter {
    path: PathBuf,
    out: BufWriter<File>,
    blocks: usize,
}

impl ReportWriter {
    /// Create (or truncate) the report at `path`.
    pub fn create(path: &Path) -> Result<Self, HarnessError> {
        let file = File::create(path).map_err(|source| HarnessError::Report {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            blocks: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of fixture blocks written so far.
    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    /// Append the block for one processed fixture.
    pub fn append(&mut self, pair: &FixturePair, result: &ParsedResult, count_cases: bool) -> Result<(), HarnessError> {
        let directory = display_dir(&pair.directory);
        let source_file = pair.source_path().display().to_string();
        let queries_file = pair.query_path().display().to_string();
        let block = ReportBlock {
            directory: &directory,
            source_file: &source_file,
            queries_file: &queries_file,
            result,
            count_cases,
        };

        self.out
            .write_all(block.render().as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|source| HarnessError::Report {
                path: self.path.clone(),
                source,
            })?;
        self.blocks += 1;
        Ok(())
    }

    /// Flush and close the report.
    pub fn finish(mut self) -> Result<(), HarnessError> {
        self.out.flush().map_err(|source| HarnessError::Report {
            path: self.path.clone(),
            source,
        })
    }
}

/// Directory key as printed in the report; the working root itself shows as `.`.
fn display_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        ".".to_string()
    } else {
        dir.display().to_string()
    }
}
