//! Implementation of the `batchmake make` command.
//!
//! Builds every discovered target with the build parameter exported in the
//! environment, stopping at the first failing target.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context as _, Result};
use tracing::info;

use batchmake_lib::runner::{BuildCommand, BuildParameter, FailurePolicy, RunOutcome, RunState, Runner};
use batchmake_lib::target::discover_targets;

use super::{Context, runtime};
use crate::output::{
  format_elapsed, plural, print_error, print_header, print_info, print_json, print_stat, print_success, symbols,
};

pub fn cmd_make(ctx: &Context, param: Option<String>, keep_going: bool) -> Result<ExitCode> {
  let command = ctx.config.build_command().context("Invalid build command")?;
  run_in_targets(ctx, command, param, keep_going)
}

/// Run `command` in every target under the context root.
pub(crate) fn run_in_targets(
  ctx: &Context,
  command: BuildCommand,
  param: Option<String>,
  keep_going: bool,
) -> Result<ExitCode> {
  let parameter = param.map(BuildParameter).unwrap_or_else(|| ctx.config.default_param());
  let policy = if keep_going {
    FailurePolicy::KeepGoing
  } else {
    ctx.config.policy()
  };

  let targets = discover_targets(&ctx.root, &ctx.config.discovery_options())
    .with_context(|| format!("Failed to discover targets in {}", ctx.root.display()))?;
  info!(count = targets.len(), param = %parameter, "running {}", command.display());

  let env_binding = format!("{}={}", command.param_var, parameter);
  let mut runner = Runner::new(command).with_policy(policy);
  if !ctx.format.is_json() {
    runner = runner.on_progress(print_progress);
  }

  let started = Instant::now();
  let report = runtime()?.block_on(runner.run_all(&targets, &parameter))?;
  let elapsed = started.elapsed();

  if ctx.format.is_json() {
    print_json(&report)?;
  } else {
    println!();
    match &report.outcome {
      RunOutcome::Success => {
        print_success(&format!(
          "Built {} with {} in {}",
          plural(report.built.len(), "target"),
          env_binding,
          format_elapsed(elapsed)
        ));
      }
      RunOutcome::Failed { .. } => {
        print_error(&format!("{} failed", plural(report.failures.len(), "target")));
        for failure in &report.failures {
          print_stat(
            &format!("{} {}", symbols::ERROR, failure.target.name),
            &format!("exit code {}", failure.code),
          );
        }
        if !report.skipped.is_empty() {
          print_info(&format!("Skipped {}", plural(report.skipped.len(), "target")));
        }
      }
    }
  }

  Ok(if report.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

pub(crate) fn print_progress(state: &RunState) {
  match state {
    RunState::Running(target) => print_header(&target.name),
    RunState::Stopped(failure) => print_error(&format!(
      "Build failed: {} (exit code {})",
      failure.target.name, failure.code
    )),
    RunState::Pending | RunState::Completed => {}
  }
}
