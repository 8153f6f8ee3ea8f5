// src/formula/kitchen/runner.rs

//! Execution of external build commands

use crate::env::EnvOverrides;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Captured result of one external command
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StageOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout and stderr joined, as reported in stage failures
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }

    /// Turn a non-zero exit into a stage failure carrying the output
    pub fn check(self, stage: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::BuildStageFailure {
                stage: stage.to_string(),
                exit_code: self.exit_code,
                output: self.combined(),
            })
        }
    }
}

/// Runs a command for a named stage
///
/// Implementations report the exit status in [`StageOutput`]; only failure
/// to start the process is an `Err`.
pub trait StageRunner: Send + Sync {
    fn run(
        &self,
        stage: &str,
        command: &[String],
        env: &EnvOverrides,
        workdir: &Path,
    ) -> Result<StageOutput>;
}

/// Runs commands directly with `std::process::Command`
///
/// The child inherits the process environment with the overrides layered on
/// top; the parent's environment is never modified.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl StageRunner for ShellRunner {
    fn run(
        &self,
        stage: &str,
        command: &[String],
        env: &EnvOverrides,
        workdir: &Path,
    ) -> Result<StageOutput> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::InvalidFormula(format!("{} stage has an empty command", stage)))?;

        debug!("[{}] {} (in {})", stage, command.join(" "), workdir.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .envs(env.iter())
            .output()
            .map_err(|e| Error::IoError(format!("Failed to run {} stage ({}): {}", stage, program, e)))?;

        Ok(StageOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
