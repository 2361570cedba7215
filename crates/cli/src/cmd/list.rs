//! Implementation of the `batchmake list` command.

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use batchmake_lib::target::discover_targets;

use super::Context;
use crate::output::{print_info, print_json, symbols};

pub fn cmd_list(ctx: &Context) -> Result<ExitCode> {
  let options = ctx.config.discovery_options();
  let targets = discover_targets(&ctx.root, &options)
    .with_context(|| format!("Failed to discover targets in {}", ctx.root.display()))?;

  if ctx.format.is_json() {
    print_json(&targets)?;
  } else if targets.is_empty() {
    print_info(&format!(
      "No directories containing {} under {}",
      options.marker,
      ctx.root.display()
    ));
  } else {
    for target in &targets {
      println!("  {} {}", symbols::INFO, target.name);
    }
  }

  Ok(ExitCode::SUCCESS)
}
