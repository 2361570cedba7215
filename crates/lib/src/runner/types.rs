//! Types for batch build runs.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_BUILD_COMMAND, DEFAULT_PARAM, DEFAULT_PARAM_VAR};
use crate::target::Target;

/// Value handed to every target build, e.g. a board identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParameter(pub String);

impl Default for BuildParameter {
  fn default() -> Self {
    Self(DEFAULT_PARAM.to_string())
  }
}

impl fmt::Display for BuildParameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for BuildParameter {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

/// The external tool run in each target, and how the parameter reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
  pub program: String,
  pub args: Vec<String>,
  /// Environment variable the [`BuildParameter`] is exported as.
  pub param_var: String,
}

impl BuildCommand {
  /// Build a command from an argv list. Returns `None` for an empty list.
  pub fn from_argv<S: AsRef<str>>(argv: &[S], param_var: impl Into<String>) -> Option<Self> {
    let (program, args) = argv.split_first()?;
    Some(Self {
      program: program.as_ref().to_string(),
      args: args.iter().map(|a| a.as_ref().to_string()).collect(),
      param_var: param_var.into(),
    })
  }

  pub fn display(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

impl Default for BuildCommand {
  fn default() -> Self {
    Self {
      program: DEFAULT_BUILD_COMMAND[0].to_string(),
      args: DEFAULT_BUILD_COMMAND[1..].iter().map(|a| a.to_string()).collect(),
      param_var: DEFAULT_PARAM_VAR.to_string(),
    }
  }
}

/// What to do after a target fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
  /// Stop at the first failing target.
  #[default]
  FailFast,
  /// Build every target and report all failures.
  KeepGoing,
}

/// Outcome of building a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "code", rename_all = "snake_case")]
pub enum BuildStatus {
  Success,
  Failed(i32),
}

impl BuildStatus {
  pub fn from_code(code: i32) -> Self {
    if code == 0 { Self::Success } else { Self::Failed(code) }
  }
}

/// A target whose build returned a non-zero exit code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
  pub target: Target,
  pub code: i32,
}

/// Overall result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
  Success,
  /// The first target that failed.
  Failed { target: Target, code: i32 },
}

impl RunOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, RunOutcome::Success)
  }
}

/// Detailed result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub outcome: RunOutcome,
  /// Targets that built successfully, in build order.
  pub built: Vec<Target>,
  /// Every failed target, in build order.
  pub failures: Vec<TargetFailure>,
  /// Targets never invoked because the run stopped early.
  pub skipped: Vec<Target>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.outcome.is_success()
  }
}

/// Runner progress. Transitions only move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
  Pending,
  Running(Target),
  Stopped(TargetFailure),
  Completed,
}

/// Errors that abort a run without an exit code to report.
#[derive(Debug, Error)]
pub enum RunError {
  /// The build tool could not be launched.
  #[error("failed to launch {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// Waiting on the child failed.
  #[error("failed waiting for {program}: {source}")]
  Wait {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The target directory cannot be entered.
  #[error("cannot enter target directory {path}: {source}")]
  TargetDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The user interrupted the run.
  #[error("interrupted in {cwd}")]
  Interrupted { cwd: PathBuf },
}
