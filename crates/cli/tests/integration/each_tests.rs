use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn each_runs_command_in_every_target() {
  let env = TestEnv::with_targets(&["01_wait", "02_init"]);

  env
    .bm_cmd()
    .args(["each", "--", "/bin/sh", "-c", "touch cleaned"])
    .assert()
    .success();

  assert!(env.root().join("01_wait/cleaned").exists());
  assert!(env.root().join("02_init/cleaned").exists());
  assert!(!env.root().join("cleaned").exists());
}

#[test]
fn each_stops_at_first_failure() {
  let env = TestEnv::with_targets(&["a", "b"]);

  env
    .bm_cmd()
    .args(["each", "--", "/bin/sh", "-c", "touch ran; exit 3"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Build failed: a (exit code 3)"));

  assert!(env.root().join("a/ran").exists());
  assert!(!env.root().join("b/ran").exists());
}

#[test]
fn each_requires_a_command() {
  let env = TestEnv::with_targets(&["a"]);

  env.bm_cmd().arg("each").assert().failure();
}
