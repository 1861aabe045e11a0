//! Harness I/O boundary interfaces
//!
//! The external analyzer is reached through the [`FixtureExecutor`] trait so the driver can be exercised
//! without a build system, and so other ways of running the tool (a different build program, a direct binary)
//! can be plugged in. [`MakeExecutor`] is the default: `make autotester source=… query=… out=…`.

use std::path::Path;
use std::process::Command;

use crate::discovery::FixturePair;
use crate::errors::HarnessError;

// ============================================================================
// Fixture Executor Interface
// ============================================================================

/// Run the external tool for one fixture pair.
///
/// Implementations block until the tool has finished. On success the output log named by
/// [`FixturePair::output_path`] is expected to exist below `work_dir`; the driver reads it next.
pub trait FixtureExecutor {
    fn execute(&self, pair: &FixturePair, work_dir: &Path) -> Result<(), HarnessError>;
}

// ============================================================================
// Default Implementation
// ============================================================================

/// Invokes a make-style build target with `source=`, `query=` and `out=` parameters.
#[derive(Debug, Clone)]
pub struct MakeExecutor {
    program: String,
    target: String,
}

impl MakeExecutor {
    pub fn new(program: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            target: target.into(),
        }
    }

    /// The three named parameters handed to the build target.
    pub fn parameters(pair: &FixturePair) -> [String; 3] {
        [
            format!("source={}", pair.source_path().display()),
            format!("query={}", pair.query_path().display()),
            format!("out={}", pair.output_path().display()),
        ]
    }
}

impl FixtureExecutor for MakeExecutor {
    fn execute(&self, pair: &FixturePair, work_dir: &Path) -> Result<(), HarnessError> {
        let params = Self::parameters(pair);
        tracing::debug!(program = %self.program, target = %self.target, ?params, "invoking external tool");

        let status = Command::new(&self.program)
            .arg(&self.target)
            .args(&params)
            .current_dir(work_dir)
            .status()
            .map_err(|e| HarnessError::ExternalTool {
                source_file: pair.source_path(),
                reason: format!("failed to launch `{}`: {}", self.program, e),
            })?;

        if !status.success() {
            return Err(HarnessError::ExternalTool {
                source_file: pair.source_path(),
                reason: format!("`{} {}` exited with {}", self.program, self.target, status),
            });
        }
        Ok(())
    }
}
