//! Directory tree comparison.
//!
//! Walks two trees in sorted order and reports which relative paths exist on
//! only one side, and which files exist on both sides with different content.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiffError {
  #[error("not a directory: {0}")]
  NotADirectory(PathBuf),

  #[error("failed to walk {path}: {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Differences between two trees, as paths relative to each root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeDiff {
  pub only_left: Vec<PathBuf>,
  pub only_right: Vec<PathBuf>,
  pub changed: Vec<PathBuf>,
}

impl TreeDiff {
  pub fn is_empty(&self) -> bool {
    self.only_left.is_empty() && self.only_right.is_empty() && self.changed.is_empty()
  }

  pub fn len(&self) -> usize {
    self.only_left.len() + self.only_right.len() + self.changed.len()
  }
}

#[derive(Debug, PartialEq, Eq)]
enum Entry {
  Dir,
  File(String),
  Link(PathBuf),
}

/// Compare `left` and `right`, skipping entries whose name is in `exclude`.
pub fn diff_trees(left: &Path, right: &Path, exclude: &[String]) -> Result<TreeDiff, DiffError> {
  let left_entries = collect(left, exclude)?;
  let right_entries = collect(right, exclude)?;

  let mut diff = TreeDiff::default();
  for (path, entry) in &left_entries {
    match right_entries.get(path) {
      None => diff.only_left.push(path.clone()),
      Some(other) if other != entry => diff.changed.push(path.clone()),
      Some(_) => {}
    }
  }
  for path in right_entries.keys() {
    if !left_entries.contains_key(path) {
      diff.only_right.push(path.clone());
    }
  }

  debug!(left = %left.display(), right = %right.display(), differences = diff.len(), "compared trees");
  Ok(diff)
}

fn collect(root: &Path, exclude: &[String]) -> Result<BTreeMap<PathBuf, Entry>, DiffError> {
  if !root.is_dir() {
    return Err(DiffError::NotADirectory(root.to_path_buf()));
  }

  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
    e.depth() == 0 || !exclude.iter().any(|name| e.file_name() == name.as_str())
  });

  let mut entries = BTreeMap::new();
  for entry in walker {
    let entry = entry.map_err(|source| DiffError::Walk {
      path: source.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
      source,
    })?;
    if entry.depth() == 0 {
      continue;
    }

    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
    let file_type = entry.file_type();
    let value = if file_type.is_dir() {
      Entry::Dir
    } else if file_type.is_file() {
      Entry::File(hash_file(entry.path())?)
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(|source| DiffError::ReadFile {
        path: entry.path().to_path_buf(),
        source,
      })?;
      Entry::Link(target)
    } else {
      continue;
    };
    entries.insert(rel, value);
  }
  Ok(entries)
}

fn hash_file(path: &Path) -> Result<String, DiffError> {
  let read_err = |source| DiffError::ReadFile {
    path: path.to_path_buf(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];
  loop {
    let n = file.read(&mut buffer).map_err(read_err)?;
    if n == 0 {
      break;
    }
    hasher.update(&buffer[..n]);
  }
  Ok(hex::encode(hasher.finalize()))
}
