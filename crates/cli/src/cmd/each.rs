//! Implementation of the `batchmake each` command.
//!
//! Runs an arbitrary command in every target, with the same ordering and
//! failure handling as `batchmake make`.

use std::process::ExitCode;

use anyhow::{Result, bail};

use batchmake_lib::runner::BuildCommand;

use super::Context;
use super::make::run_in_targets;

/// Run an arbitrary command in every target, e.g. `batchmake each -- make clean`.
pub fn cmd_each(ctx: &Context, command: Vec<String>, param: Option<String>, keep_going: bool) -> Result<ExitCode> {
  let Some(command) = BuildCommand::from_argv(command.as_slice(), ctx.config.param_var()) else {
    bail!("No command given");
  };
  run_in_targets(ctx, command, param, keep_going)
}
