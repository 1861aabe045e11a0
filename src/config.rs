//! Harness configuration.

use std::path::{Path, PathBuf};

use systest_core::{Convention, LogLayout};

/// Fixture tree searched when none is given, relative to the working directory.
pub const DEFAULT_FIXTURES_DIR: &str = "Team05/Tests05";

/// Report file name, created inside the fixture tree unless overridden.
pub const DEFAULT_REPORT_NAME: &str = "results.txt";

/// Build tool invoked once per fixture pair.
pub const DEFAULT_MAKE_PROGRAM: &str = "make";

/// Build target that runs the analyzer.
pub const DEFAULT_MAKE_TARGET: &str = "autotester";

/// Everything one harness run needs to know.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Invoke the external tool; when false only discovery runs and the report stays empty
    pub run_tests: bool,
    /// Leave generated output logs on disk after the run
    pub keep_output: bool,
    /// Directory the external tool runs in; fixture paths are relative to it
    pub work_dir: PathBuf,
    /// Root of the fixture tree, relative to `work_dir` unless absolute
    pub fixtures_dir: PathBuf,
    /// Report location, relative to `work_dir` unless absolute
    pub report_path: Option<PathBuf>,
    pub convention: Convention,
    pub layout: LogLayout,
    pub make_program: String,
    pub make_target: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            run_tests: true,
            keep_output: false,
            work_dir: PathBuf::from("."),
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            report_path: None,
            convention: Convention::default(),
            layout: LogLayout::default(),
            make_program: DEFAULT_MAKE_PROGRAM.to_string(),
            make_target: DEFAULT_MAKE_TARGET.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_tests(mut self, run_tests: bool) -> Self {
        self.run_tests = run_tests;
        self
    }

    pub fn with_keep_output(mut self, keep_output: bool) -> Self {
        self.keep_output = keep_output;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_fixtures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = dir.into();
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    pub fn with_convention(mut self, convention: Convention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_layout(mut self, layout: LogLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the build program and target (`make autotester` by default)
    pub fn with_tool(mut self, program: impl Into<String>, target: impl Into<String>) -> Self {
        self.make_program = program.into();
        self.make_target = target.into();
        self
    }

    /// Absolute-or-work-dir-relative root of the fixture tree.
    pub fn fixtures_root(&self) -> PathBuf {
        resolve(&self.work_dir, &self.fixtures_dir)
    }

    /// Where the report is written: the explicit path, or `results.txt` at the fixture root.
    pub fn report_file(&self) -> PathBuf {
        match &self.report_path {
            Some(path) => resolve(&self.work_dir, path),
            None => self.fixtures_root().join(DEFAULT_REPORT_NAME),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
