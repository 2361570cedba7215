//! Implementation of the `batchmake publish` command.
//!
//! Runs the publish checklist (clean, format, lint, build, ...) as a chain of
//! steps and stops at the first step that fails.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context as _, Result};

use batchmake_lib::pipeline::{Pipeline, PipelineContext, PipelineEvent, StepOutcome};
use batchmake_lib::runner::{BuildParameter, FailurePolicy};

use super::make::print_progress;
use super::{Context, runtime};
use crate::output::{format_elapsed, plural, print_error, print_info, print_json, print_success};

pub fn cmd_publish(ctx: &Context, param: Option<String>, keep_going: bool) -> Result<ExitCode> {
  let steps = ctx.config.publish_steps().context("Invalid publish steps")?;
  let root = dunce::canonicalize(&ctx.root)
    .with_context(|| format!("Cannot access root directory {}", ctx.root.display()))?;

  let pipeline_ctx = PipelineContext {
    root,
    discovery: ctx.config.discovery_options(),
    parameter: param.map(BuildParameter).unwrap_or_else(|| ctx.config.default_param()),
    param_var: ctx.config.param_var(),
    policy: if keep_going {
      FailurePolicy::KeepGoing
    } else {
      ctx.config.policy()
    },
  };

  let mut pipeline = Pipeline::new(steps);
  if !ctx.format.is_json() {
    pipeline = pipeline.on_event(print_event);
  }

  let started = Instant::now();
  let report = runtime()?.block_on(pipeline.run(&pipeline_ctx))?;

  if ctx.format.is_json() {
    print_json(&report)?;
  } else {
    println!();
    match &report.failed {
      None => print_success(&format!(
        "Ready for publish: {} passed in {}",
        plural(report.completed.len(), "step"),
        format_elapsed(started.elapsed())
      )),
      Some((step, reason)) => {
        print_error(&format!("Step {} failed: {}", step, reason));
        if !report.skipped.is_empty() {
          print_info(&format!("Skipped {}: {}", plural(report.skipped.len(), "step"), report.skipped.join(", ")));
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

fn print_event(event: &PipelineEvent) {
  match event {
    PipelineEvent::StepStarted(name) => print_info(&format!("Step: {}", name)),
    PipelineEvent::Target(state) => print_progress(state),
    PipelineEvent::StepFinished(name, StepOutcome::Passed) => print_success(&format!("Step {} passed", name)),
    PipelineEvent::StepFinished(_, StepOutcome::Failed(_)) => {}
  }
}
