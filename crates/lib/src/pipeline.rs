//! Sequential pipeline of fallible steps.
//!
//! A pipeline chains whole-tree operations (clean every target, lint every
//! target, build every target, run a helper script, compare two trees) and
//! stops at the first step that fails. Steps that run per target rediscover
//! the targets when they start, since an earlier step may have changed the
//! tree. One Ctrl-C listener covers the whole pipeline, so an interrupt
//! between steps or during a tree diff still stops it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::process::{Interrupt, Invocation, Invoker, ProcessInvoker};
use crate::runner::{
  BuildCommand, BuildParameter, FailurePolicy, RunError, RunOutcome, RunState, Runner, check_dir,
};
use crate::target::{DiscoveryError, DiscoveryOptions, discover_targets};
use crate::treediff::{DiffError, diff_trees};

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
  /// Run a command in every discovered target.
  Each { command: Vec<String> },
  /// Run a command once, in `dir` (relative to the pipeline root).
  Shell { command: Vec<String>, dir: PathBuf },
  /// Compare two trees (relative to the pipeline root); any difference fails the step.
  Diff { left: PathBuf, right: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub name: String,
  pub kind: StepKind,
}

impl Step {
  pub fn each(name: impl Into<String>, command: &[&str]) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Each {
        command: command.iter().map(|s| s.to_string()).collect(),
      },
    }
  }

  pub fn shell(name: impl Into<String>, command: &[&str], dir: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Shell {
        command: command.iter().map(|s| s.to_string()).collect(),
        dir: dir.into(),
      },
    }
  }

  pub fn diff(name: impl Into<String>, left: impl Into<PathBuf>, right: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Diff {
        left: left.into(),
        right: right.into(),
      },
    }
  }
}

/// Steps run when no pipeline is configured. The `make` step runs `build`,
/// the same command `batchmake make` uses.
pub fn default_steps(build: Vec<String>) -> Vec<Step> {
  vec![
    Step::each("clean", &["make", "clean"]),
    Step::each("fmt", &["cargo", "fmt"]),
    Step::each("clippy", &["cargo", "clippy"]),
    Step::each("clean", &["make", "clean"]),
    Step {
      name: "make".to_string(),
      kind: StepKind::Each { command: build },
    },
    Step::each("clean", &["make", "clean"]),
  ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
  Passed,
  Failed(String),
}

/// Shared inputs for every step.
#[derive(Debug, Clone)]
pub struct PipelineContext {
  pub root: PathBuf,
  pub discovery: DiscoveryOptions,
  pub parameter: BuildParameter,
  pub param_var: String,
  pub policy: FailurePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
  pub completed: Vec<String>,
  /// Name of the failing step and why it failed.
  pub failed: Option<(String, String)>,
  pub skipped: Vec<String>,
}

impl PipelineReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_none()
  }
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("step {step}: {source}")]
  Run {
    step: String,
    #[source]
    source: RunError,
  },

  #[error("step {step}: {source}")]
  Discovery {
    step: String,
    #[source]
    source: DiscoveryError,
  },

  #[error("step {step}: {source}")]
  Diff {
    step: String,
    #[source]
    source: DiffError,
  },

  #[error("step {0} has an empty command")]
  EmptyCommand(String),
}

/// Progress notifications for a running pipeline.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
  StepStarted(String),
  Target(RunState),
  StepFinished(String, StepOutcome),
}

type Observer = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

pub struct Pipeline<I = ProcessInvoker> {
  steps: Vec<Step>,
  invoker: I,
  interrupt: Interrupt,
  observer: Option<Observer>,
}

impl Pipeline<ProcessInvoker> {
  pub fn new(steps: Vec<Step>) -> Self {
    Self {
      steps,
      invoker: ProcessInvoker,
      interrupt: Interrupt::new(),
      observer: None,
    }
  }
}

impl<I: Invoker> Pipeline<I> {
  pub fn with_invoker<J: Invoker>(self, invoker: J) -> Pipeline<J> {
    Pipeline {
      steps: self.steps,
      invoker,
      interrupt: self.interrupt,
      observer: self.observer,
    }
  }

  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.interrupt = interrupt;
    self
  }

  pub fn on_event(mut self, observer: impl Fn(&PipelineEvent) + Send + Sync + 'static) -> Self {
    self.observer = Some(Arc::new(observer));
    self
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  fn notify(&self, event: PipelineEvent) {
    if let Some(observer) = &self.observer {
      observer(&event);
    }
  }

  /// Run every step in order, halting at the first failed step.
  pub async fn run(&self, ctx: &PipelineContext) -> Result<PipelineReport, PipelineError> {
    let mut report = PipelineReport::default();
    let _ctrl_c = self.interrupt.listen_for_ctrl_c().await;

    for (index, step) in self.steps.iter().enumerate() {
      self.check_interrupt(step, ctx)?;
      info!(step = %step.name, "starting step");
      self.notify(PipelineEvent::StepStarted(step.name.clone()));

      let outcome = self.run_step(step, ctx).await?;
      self.check_interrupt(step, ctx)?;
      self.notify(PipelineEvent::StepFinished(step.name.clone(), outcome.clone()));

      match outcome {
        StepOutcome::Passed => report.completed.push(step.name.clone()),
        StepOutcome::Failed(reason) => {
          warn!(step = %step.name, reason = %reason, "step failed");
          report.failed = Some((step.name.clone(), reason));
          report.skipped = self.steps[index + 1..].iter().map(|s| s.name.clone()).collect();
          return Ok(report);
        }
      }
    }

    Ok(report)
  }

  fn check_interrupt(&self, step: &Step, ctx: &PipelineContext) -> Result<(), PipelineError> {
    if self.interrupt.is_triggered() {
      return Err(PipelineError::Run {
        step: step.name.clone(),
        source: RunError::Interrupted { cwd: ctx.root.clone() },
      });
    }
    Ok(())
  }

  async fn run_step(&self, step: &Step, ctx: &PipelineContext) -> Result<StepOutcome, PipelineError> {
    match &step.kind {
      StepKind::Each { command } => self.run_each(step, command, ctx).await,
      StepKind::Shell { command, dir } => self.run_shell(step, command, &ctx.root.join(dir), ctx).await,
      StepKind::Diff { left, right } => {
        let diff = diff_trees(&ctx.root.join(left), &ctx.root.join(right), &ctx.discovery.exclude).map_err(
          |source| PipelineError::Diff {
            step: step.name.clone(),
            source,
          },
        )?;
        if diff.is_empty() {
          Ok(StepOutcome::Passed)
        } else {
          Ok(StepOutcome::Failed(format!(
            "{} difference(s) between {} and {}",
            diff.len(),
            left.display(),
            right.display()
          )))
        }
      }
    }
  }

  async fn run_each(&self, step: &Step, command: &[String], ctx: &PipelineContext) -> Result<StepOutcome, PipelineError> {
    let command = BuildCommand::from_argv(command, ctx.param_var.clone())
      .ok_or_else(|| PipelineError::EmptyCommand(step.name.clone()))?;
    let targets = discover_targets(&ctx.root, &ctx.discovery).map_err(|source| PipelineError::Discovery {
      step: step.name.clone(),
      source,
    })?;

    let mut runner = Runner::new(command)
      .with_policy(ctx.policy)
      .with_interrupt(self.interrupt.clone());
    if let Some(observer) = self.observer.clone() {
      runner = runner.on_progress(move |state| observer(&PipelineEvent::Target(state.clone())));
    }

    let report = runner
      .with_invoker(&self.invoker)
      .run_all(&targets, &ctx.parameter)
      .await
      .map_err(|source| PipelineError::Run {
        step: step.name.clone(),
        source,
      })?;

    Ok(match report.outcome {
      RunOutcome::Success => StepOutcome::Passed,
      RunOutcome::Failed { target, code } => {
        StepOutcome::Failed(format!("target {} exited with code {}", target.name, code))
      }
    })
  }

  async fn run_shell(
    &self,
    step: &Step,
    command: &[String],
    dir: &Path,
    ctx: &PipelineContext,
  ) -> Result<StepOutcome, PipelineError> {
    let (program, args) = command
      .split_first()
      .ok_or_else(|| PipelineError::EmptyCommand(step.name.clone()))?;
    let env = vec![(ctx.param_var.clone(), ctx.parameter.0.clone())];
    let invocation = Invocation {
      program,
      args,
      cwd: dir,
      env: &env,
      interrupt: &self.interrupt,
    };

    let run_error = |source: RunError| PipelineError::Run {
      step: step.name.clone(),
      source,
    };
    check_dir(dir).await.map_err(run_error)?;
    let code = self.invoker.invoke(&invocation).await.map_err(run_error)?;

    Ok(if code == 0 {
      StepOutcome::Passed
    } else {
      StepOutcome::Failed(format!("{} exited with code {}", program, code))
    })
  }
}
