//! Batch build runner.
//!
//! Runs one build command per target, in that target's directory, with the
//! build parameter exported in the child's environment. Targets are built one
//! at a time in the order given. Under [`FailurePolicy::FailFast`] the first
//! failing target ends the run and later targets are never spawned. A user
//! interrupt ends the run under either policy.

mod types;

pub use types::*;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::process::{Interrupt, Invocation, Invoker, ProcessInvoker};
use crate::target::Target;

type Observer = Box<dyn Fn(&RunState) + Send + Sync>;

pub struct Runner<I = ProcessInvoker> {
  command: BuildCommand,
  policy: FailurePolicy,
  invoker: I,
  interrupt: Interrupt,
  observer: Option<Observer>,
}

impl Runner<ProcessInvoker> {
  pub fn new(command: BuildCommand) -> Self {
    Self {
      command,
      policy: FailurePolicy::default(),
      invoker: ProcessInvoker,
      interrupt: Interrupt::new(),
      observer: None,
    }
  }
}

impl<I: Invoker> Runner<I> {
  /// Swap the process launcher.
  pub fn with_invoker<J: Invoker>(self, invoker: J) -> Runner<J> {
    Runner {
      command: self.command,
      policy: self.policy,
      invoker,
      interrupt: self.interrupt,
      observer: self.observer,
    }
  }

  /// Share an interrupt with an enclosing run.
  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.interrupt = interrupt;
    self
  }

  pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Register a callback invoked on every state transition.
  pub fn on_progress(mut self, observer: impl Fn(&RunState) + Send + Sync + 'static) -> Self {
    self.observer = Some(Box::new(observer));
    self
  }

  pub fn command(&self) -> &BuildCommand {
    &self.command
  }

  pub fn policy(&self) -> FailurePolicy {
    self.policy
  }

  fn notify(&self, state: RunState) {
    debug!(state = ?state, "runner state");
    if let Some(observer) = &self.observer {
      observer(&state);
    }
  }

  /// Build every target in order.
  ///
  /// A non-zero exit is reported through [`RunReport::outcome`], never as an
  /// error. An empty target list succeeds without spawning anything.
  ///
  /// # Errors
  ///
  /// Returns [`RunError`] when a target directory cannot be entered, the
  /// build tool cannot be launched, or the run is interrupted.
  pub async fn run_all(&self, targets: &[Target], parameter: &BuildParameter) -> Result<RunReport, RunError> {
    let env = vec![(self.command.param_var.clone(), parameter.0.clone())];
    let mut report = RunReport {
      outcome: RunOutcome::Success,
      built: Vec::new(),
      failures: Vec::new(),
      skipped: Vec::new(),
    };

    let _ctrl_c = self.interrupt.listen_for_ctrl_c().await;
    self.notify(RunState::Pending);

    for (index, target) in targets.iter().enumerate() {
      self.check_interrupt(&target.path)?;
      check_dir(&target.path).await?;

      info!(name = %target.name, param = %parameter, cmd = %self.command.display(), "building target");
      self.notify(RunState::Running(target.clone()));

      let invocation = Invocation {
        program: &self.command.program,
        args: &self.command.args,
        cwd: &target.path,
        env: &env,
        interrupt: &self.interrupt,
      };

      let code = self.invoker.invoke(&invocation).await?;
      self.check_interrupt(&target.path)?;

      match BuildStatus::from_code(code) {
        BuildStatus::Success => report.built.push(target.clone()),
        BuildStatus::Failed(code) => {
          warn!(name = %target.name, code, "build failed");
          if report.failures.is_empty() {
            report.outcome = RunOutcome::Failed {
              target: target.clone(),
              code,
            };
          }
          report.failures.push(TargetFailure {
            target: target.clone(),
            code,
          });

          if self.policy == FailurePolicy::FailFast {
            report.skipped = targets[index + 1..].to_vec();
            self.notify(RunState::Stopped(TargetFailure {
              target: target.clone(),
              code,
            }));
            return Ok(report);
          }
        }
      }
    }

    match report.failures.first() {
      Some(first) => self.notify(RunState::Stopped(first.clone())),
      None => self.notify(RunState::Completed),
    }

    Ok(report)
  }

  fn check_interrupt(&self, cwd: &Path) -> Result<(), RunError> {
    if self.interrupt.is_triggered() {
      warn!(cwd = %cwd.display(), "run interrupted");
      return Err(RunError::Interrupted { cwd: cwd.to_path_buf() });
    }
    Ok(())
  }
}

/// Fail with [`RunError::TargetDir`] unless `path` is an existing directory.
pub(crate) async fn check_dir(path: &Path) -> Result<(), RunError> {
  let meta = tokio::fs::metadata(path).await.map_err(|source| RunError::TargetDir {
    path: path.to_path_buf(),
    source,
  })?;
  if !meta.is_dir() {
    return Err(RunError::TargetDir {
      path: path.to_path_buf(),
      source: std::io::Error::other("not a directory"),
    });
  }
  Ok(())
}
