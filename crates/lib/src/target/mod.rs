//! Build target discovery.
//!
//! A target is a directory that contains a marker file (by default
//! `Cargo.toml`). Discovery walks a root directory recursively and returns the
//! parent directory of every marker it finds, ordered by path so that runs
//! are reproducible.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::consts::{DEFAULT_EXCLUDE, DEFAULT_MARKER};

/// One buildable directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Target {
  /// Absolute location of the target directory.
  pub path: PathBuf,
  /// Path relative to the discovery root, `.` for the root itself.
  pub name: String,
}

impl Target {
  /// Create a target whose name is the path as given.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let name = path.display().to_string();
    Self { path, name }
  }

  fn under_root(root: &Path, path: PathBuf) -> Self {
    let name = match path.strip_prefix(root) {
      Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
      Ok(rel) => rel.display().to_string(),
      Err(_) => path.display().to_string(),
    };
    Self { path, name }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// Controls how [`discover_targets`] walks the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
  /// File name identifying a target directory.
  pub marker: String,
  /// Directory names that are not descended into.
  pub exclude: Vec<String>,
  /// Deepest target directory to consider, relative to the root (root = 0).
  pub max_depth: Option<usize>,
}

impl Default for DiscoveryOptions {
  fn default() -> Self {
    Self {
      marker: DEFAULT_MARKER.to_string(),
      exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
      max_depth: None,
    }
  }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
  #[error("cannot access root directory {path}: {source}")]
  RootNotFound {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("root is not a directory: {0}")]
  NotADirectory(PathBuf),

  #[error("failed to walk {path}: {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

/// Find every directory under `root` that contains the marker file.
///
/// Returns targets in lexicographic path order without duplicates. A root
/// with no markers yields an empty list.
///
/// # Errors
///
/// Returns [`DiscoveryError`] when the root is missing, not a directory, or a
/// directory below it cannot be read.
pub fn discover_targets(root: &Path, options: &DiscoveryOptions) -> Result<Vec<Target>, DiscoveryError> {
  let root = dunce::canonicalize(root).map_err(|source| DiscoveryError::RootNotFound {
    path: root.to_path_buf(),
    source,
  })?;
  if !root.is_dir() {
    return Err(DiscoveryError::NotADirectory(root));
  }

  let mut walker = WalkDir::new(&root).sort_by_file_name();
  if let Some(depth) = options.max_depth {
    // The marker sits one level below its target directory.
    walker = walker.max_depth(depth + 1);
  }

  let walker = walker.into_iter().filter_entry(|e| {
    e.depth() == 0
      || !e.file_type().is_dir()
      || !options.exclude.iter().any(|name| e.file_name() == name.as_str())
  });

  let mut found = BTreeSet::new();
  for entry in walker {
    let entry = entry.map_err(|source| DiscoveryError::Walk {
      path: source.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
      source,
    })?;

    if entry.file_type().is_file() && entry.file_name() == options.marker.as_str() {
      if let Some(parent) = entry.path().parent() {
        trace!(path = %parent.display(), "found marker");
        found.insert(parent.to_path_buf());
      }
    }
  }

  debug!(root = %root.display(), count = found.len(), "discovered targets");

  Ok(found.into_iter().map(|path| Target::under_root(&root, path)).collect())
}
