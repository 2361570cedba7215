//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Build command used by the tests: records `<dir> <BSP>` in `$BM_LOG` and
/// exits 2 in any directory holding a `fail` file.
pub const RECORDING_CONFIG: &str = r#"
command = ["/bin/sh", "-c", 'echo "$(basename "$PWD") $BSP" >> "$BM_LOG"; [ ! -e fail ] || exit 2']
"#;

/// Isolated test environment.
///
/// Each test gets its own temporary tree of targets and its own build log.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a tree with one target per name, using the recording build command.
  pub fn with_targets(names: &[&str]) -> Self {
    let env = Self::empty();
    env.write_file("tree/batchmake.toml", RECORDING_CONFIG);
    for name in names {
      env.write_file(&format!("tree/{}/Cargo.toml", name), "[package]\n");
    }
    env
  }

  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("tree")).unwrap();
    Self { temp }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Make the named target's build exit with code 2.
  pub fn fail_target(&self, name: &str) {
    self.write_file(&format!("tree/{}/fail", name), "");
  }

  pub fn root(&self) -> PathBuf {
    self.temp.path().join("tree")
  }

  pub fn log_path(&self) -> PathBuf {
    self.temp.path().join("build.log")
  }

  /// Lines written by the recording build command, in order.
  pub fn build_log(&self) -> Vec<String> {
    match std::fs::read_to_string(self.log_path()) {
      Ok(content) => content.lines().map(str::to_string).collect(),
      Err(_) => Vec::new(),
    }
  }

  /// Get a pre-configured Command for the batchmake binary.
  ///
  /// Sets `--root` to the test tree, points `BM_LOG` at the build log and
  /// clears `BATCHMAKE_CONFIG` so the tree's own config is used.
  pub fn bm_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("batchmake");
    cmd.arg("--root").arg(self.root());
    cmd.env("BM_LOG", self.log_path());
    cmd.env_remove("BATCHMAKE_CONFIG");
    cmd.env("NO_COLOR", "1");
    cmd
  }
}
