//! Project configuration.
//!
//! Settings come from an optional `batchmake.toml` at the project root (or
//! the file named by `BATCHMAKE_CONFIG`). Every field is optional; anything
//! left out falls back to the constants in [`crate::consts`].
//!
//! ```toml
//! marker = "Cargo.toml"
//! command = ["make"]
//! param_var = "BSP"
//! default_param = "rpi3"
//! policy = "fail-fast"
//!
//! [[publish]]
//! name = "clean"
//! each = ["make", "clean"]
//!
//! [[publish]]
//! name = "jtag"
//! shell = ["bash", "update.sh"]
//! dir = "X1_JTAG_boot"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_BUILD_COMMAND, DEFAULT_EXCLUDE, DEFAULT_MARKER, DEFAULT_PARAM,
  DEFAULT_PARAM_VAR,
};
use crate::pipeline::{Step, StepKind, default_steps};
use crate::runner::{BuildCommand, BuildParameter, FailurePolicy};
use crate::target::DiscoveryOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("build command must not be empty")]
  EmptyCommand,

  #[error("publish step {0:?} must set exactly one of `each`, `shell` or `diff`")]
  InvalidStep(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  pub marker: Option<String>,
  pub exclude: Option<Vec<String>>,
  pub max_depth: Option<usize>,
  pub command: Option<Vec<String>>,
  pub param_var: Option<String>,
  pub default_param: Option<String>,
  pub policy: Option<FailurePolicy>,
  #[serde(default)]
  pub publish: Vec<StepConfig>,
}

/// One `[[publish]]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
  pub name: String,
  pub each: Option<Vec<String>>,
  pub shell: Option<Vec<String>>,
  /// Working directory for `shell` steps, relative to the root.
  pub dir: Option<PathBuf>,
  /// Two directories to compare, relative to the root.
  pub diff: Option<(PathBuf, PathBuf)>,
}

impl StepConfig {
  fn to_step(&self) -> Result<Step, ConfigError> {
    let kind = match (&self.each, &self.shell, &self.diff) {
      (Some(command), None, None) => StepKind::Each {
        command: command.clone(),
      },
      (None, Some(command), None) => StepKind::Shell {
        command: command.clone(),
        dir: self.dir.clone().unwrap_or_else(|| PathBuf::from(".")),
      },
      (None, None, Some((left, right))) => StepKind::Diff {
        left: left.clone(),
        right: right.clone(),
      },
      _ => return Err(ConfigError::InvalidStep(self.name.clone())),
    };
    Ok(Step {
      name: self.name.clone(),
      kind,
    })
  }
}

impl Config {
  /// Load the config for `root`.
  ///
  /// `explicit` (from `--config`) wins over `BATCHMAKE_CONFIG`, which wins
  /// over `<root>/batchmake.toml`. An explicitly named file must exist; a
  /// missing default file means an empty config.
  pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let named = explicit
      .map(Path::to_path_buf)
      .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    let path = match named {
      Some(path) => path,
      None => {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
          debug!(path = %path.display(), "no config file, using defaults");
          return Ok(Self::default());
        }
        path
      }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
      path: path.clone(),
      source,
    })?;
    let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
      path: path.clone(),
      source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  pub fn discovery_options(&self) -> DiscoveryOptions {
    DiscoveryOptions {
      marker: self.marker.clone().unwrap_or_else(|| DEFAULT_MARKER.to_string()),
      exclude: self
        .exclude
        .clone()
        .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()),
      max_depth: self.max_depth,
    }
  }

  pub fn param_var(&self) -> String {
    self.param_var.clone().unwrap_or_else(|| DEFAULT_PARAM_VAR.to_string())
  }

  /// Parameter to use when none is given on the command line.
  pub fn default_param(&self) -> BuildParameter {
    BuildParameter(self.default_param.clone().unwrap_or_else(|| DEFAULT_PARAM.to_string()))
  }

  pub fn policy(&self) -> FailurePolicy {
    self.policy.unwrap_or_default()
  }

  fn build_argv(&self) -> Vec<String> {
    self
      .command
      .clone()
      .unwrap_or_else(|| DEFAULT_BUILD_COMMAND.iter().map(|s| s.to_string()).collect())
  }

  pub fn build_command(&self) -> Result<BuildCommand, ConfigError> {
    BuildCommand::from_argv(self.build_argv().as_slice(), self.param_var()).ok_or(ConfigError::EmptyCommand)
  }

  /// Publish steps, or the built-in checklist when none are configured.
  ///
  /// The built-in checklist builds with the same command as `build_command`.
  pub fn publish_steps(&self) -> Result<Vec<Step>, ConfigError> {
    if self.publish.is_empty() {
      let build = self.build_argv();
      if build.is_empty() {
        return Err(ConfigError::EmptyCommand);
      }
      return Ok(default_steps(build));
    }
    self.publish.iter().map(StepConfig::to_step).collect()
  }
}
