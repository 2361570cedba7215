//! Implementation of the `batchmake diff` command.
//!
//! Compares two directory trees and lists paths that differ. Exits non-zero
//! when the trees are not identical.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use owo_colors::{OwoColorize, Stream};

use batchmake_lib::treediff::diff_trees;

use super::Context;
use crate::output::{plural, print_json, print_success, print_warning, symbols};

pub fn cmd_diff(ctx: &Context, left: &Path, right: &Path) -> Result<ExitCode> {
  let exclude = ctx.config.discovery_options().exclude;
  let diff = diff_trees(left, right, &exclude)
    .with_context(|| format!("Failed to compare {} and {}", left.display(), right.display()))?;

  if ctx.format.is_json() {
    print_json(&diff)?;
  } else if diff.is_empty() {
    print_success(&format!("{} and {} are identical", left.display(), right.display()));
  } else {
    for path in &diff.only_left {
      println!(
        "  {} {}",
        symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
        path.display()
      );
    }
    for path in &diff.only_right {
      println!(
        "  {} {}",
        symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
        path.display()
      );
    }
    for path in &diff.changed {
      println!(
        "  {} {}",
        symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
        path.display()
      );
    }
    print_warning(&format!("{} found", plural(diff.len(), "difference")));
  }

  Ok(if diff.is_empty() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}
