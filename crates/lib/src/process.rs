//! Spawning external build tools.
//!
//! The runner never changes the process-wide working directory: each child
//! gets its directory and environment passed explicitly. Children inherit
//! stdio so tool output reaches the user unmodified, and only the exit status
//! is inspected.
//!
//! A run shares one [`Interrupt`] between the runner and every child it
//! launches. Ctrl-C sets it once for the whole run; after that no further
//! child is started and the current one is killed and reaped.

use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::runner::RunError;

/// Exit code reported for a child that was interrupted by the user.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Everything needed to launch one build tool process.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
  pub program: &'a str,
  pub args: &'a [String],
  /// Working directory for the child.
  pub cwd: &'a Path,
  /// Variables added on top of the inherited environment.
  pub env: &'a [(String, String)],
  /// Interrupt shared by the whole run.
  pub interrupt: &'a Interrupt,
}

/// Sticky record of a user interrupt, shared by clones.
#[derive(Debug, Clone)]
pub struct Interrupt {
  state: Arc<watch::Sender<bool>>,
}

impl Default for Interrupt {
  fn default() -> Self {
    Self::new()
  }
}

impl Interrupt {
  pub fn new() -> Self {
    let (state, _) = watch::channel(false);
    Self { state: Arc::new(state) }
  }

  pub fn trigger(&self) {
    self.state.send_replace(true);
  }

  pub fn is_triggered(&self) -> bool {
    *self.state.borrow()
  }

  /// Resolves once [`Interrupt::trigger`] has been called.
  pub async fn triggered(&self) {
    let mut rx = self.state.subscribe();
    // `self` keeps the sender alive, so this can only end by the flag flipping.
    let _ = rx.wait_for(|hit| *hit).await;
  }

  /// Forward Ctrl-C into this interrupt until the guard is dropped.
  ///
  /// Must be called inside a tokio runtime. The listener is registered before
  /// this returns.
  pub async fn listen_for_ctrl_c(&self) -> CtrlCListener {
    let interrupt = self.clone();
    let handle = tokio::spawn(async move {
      loop {
        match tokio::signal::ctrl_c().await {
          Ok(()) => {
            warn!("interrupt received");
            interrupt.trigger();
          }
          Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C");
            return;
          }
        }
      }
    });
    tokio::task::yield_now().await;
    CtrlCListener(handle)
  }
}

/// Stops forwarding Ctrl-C when dropped.
#[must_use]
pub struct CtrlCListener(JoinHandle<()>);

impl Drop for CtrlCListener {
  fn drop(&mut self) {
    self.0.abort();
  }
}

/// Launches a build tool and reports its exit code.
///
/// `Ok(0)` is success, any other `Ok` value is a build failure. `Err` is
/// reserved for cases where no exit code exists (the tool could not be
/// started, or the run was interrupted).
pub trait Invoker {
  fn invoke(&self, invocation: &Invocation<'_>) -> impl Future<Output = Result<i32, RunError>>;
}

impl<T: Invoker> Invoker for &T {
  async fn invoke(&self, invocation: &Invocation<'_>) -> Result<i32, RunError> {
    (**self).invoke(invocation).await
  }
}

/// Runs the invocation as a real child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
  async fn invoke(&self, invocation: &Invocation<'_>) -> Result<i32, RunError> {
    if invocation.interrupt.is_triggered() {
      return Err(RunError::Interrupted {
        cwd: invocation.cwd.to_path_buf(),
      });
    }

    let mut command = Command::new(invocation.program);
    command
      .args(invocation.args)
      .current_dir(invocation.cwd)
      .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit())
      .kill_on_drop(true);

    debug!(program = %invocation.program, args = ?invocation.args, cwd = %invocation.cwd.display(), "spawning process");

    let mut child = command.spawn().map_err(|source| RunError::Spawn {
      program: invocation.program.to_string(),
      source,
    })?;

    tokio::select! {
      biased;

      _ = invocation.interrupt.triggered() => {
        warn!(program = %invocation.program, "interrupted, stopping child process");
        if let Err(e) = child.kill().await {
          debug!(error = %e, "child already exited");
        }
        Err(RunError::Interrupted {
          cwd: invocation.cwd.to_path_buf(),
        })
      }
      status = child.wait() => {
        let status = status.map_err(|source| RunError::Wait {
          program: invocation.program.to_string(),
          source,
        })?;
        // A terminal Ctrl-C reaches the child too; its death by SIGINT is our interrupt.
        if killed_by_sigint(status) || invocation.interrupt.is_triggered() {
          invocation.interrupt.trigger();
          return Err(RunError::Interrupted {
            cwd: invocation.cwd.to_path_buf(),
          });
        }
        Ok(exit_code(status))
      }
    }
  }
}

/// Map an exit status to a shell-style exit code.
///
/// A child killed by a signal reports `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
  match status.code() {
    Some(code) => code,
    None => terminated_by_signal(status),
  }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> i32 {
  use std::os::unix::process::ExitStatusExt;
  if let Some(signal) = status.signal() {
    128 + signal
  } else if status.core_dumped() {
    255
  } else {
    -1
  }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> i32 {
  -1
}

#[cfg(unix)]
fn killed_by_sigint(status: ExitStatus) -> bool {
  use std::os::unix::process::ExitStatusExt;
  const SIGINT: i32 = 2;
  status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_sigint(_status: ExitStatus) -> bool {
  false
}
