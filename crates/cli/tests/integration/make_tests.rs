use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn make_builds_every_target_in_order() {
  let env = TestEnv::with_targets(&["c", "a", "b"]);

  env
    .bm_cmd()
    .arg("make")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built 3 targets with BSP=rpi3"));

  assert_eq!(env.build_log(), vec!["a rpi3", "b rpi3", "c rpi3"]);
}

#[test]
fn make_exports_the_given_parameter() {
  let env = TestEnv::with_targets(&["a", "b"]);

  env.bm_cmd().arg("make").arg("rpi4").assert().success();

  assert_eq!(env.build_log(), vec!["a rpi4", "b rpi4"]);
}

#[test]
fn make_stops_at_first_failure() {
  let env = TestEnv::with_targets(&["a", "b", "c"]);
  env.fail_target("b");

  env
    .bm_cmd()
    .arg("make")
    .arg("boardX")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Build failed: b (exit code 2)"));

  assert_eq!(env.build_log(), vec!["a boardX", "b boardX"]);
}

#[test]
fn make_keep_going_builds_everything() {
  let env = TestEnv::with_targets(&["a", "b", "c"]);
  env.fail_target("a");
  env.fail_target("c");

  env
    .bm_cmd()
    .arg("make")
    .arg("--keep-going")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("2 targets failed"));

  assert_eq!(env.build_log(), vec!["a rpi3", "b rpi3", "c rpi3"]);
}

#[test]
fn make_with_no_targets_succeeds() {
  let env = TestEnv::empty();
  env.write_file("tree/batchmake.toml", super::common::RECORDING_CONFIG);

  env
    .bm_cmd()
    .arg("make")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built 0 targets"));

  assert!(env.build_log().is_empty());
}

#[test]
fn make_json_reports_the_failing_target() {
  let env = TestEnv::with_targets(&["a", "b", "c"]);
  env.fail_target("b");

  let output = env.bm_cmd().args(["-o", "json", "make"]).assert().code(1).get_output().clone();

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["outcome"]["status"], "failed");
  assert_eq!(report["outcome"]["target"]["name"], "b");
  assert_eq!(report["outcome"]["code"], 2);
  assert_eq!(report["skipped"][0]["name"], "c");
}

#[test]
fn make_with_missing_tool_fails() {
  let env = TestEnv::with_targets(&["a"]);
  env.write_file("tree/batchmake.toml", "command = [\"batchmake-no-such-tool\"]\n");

  env
    .bm_cmd()
    .arg("make")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("failed to launch batchmake-no-such-tool"));
}

#[test]
fn make_with_missing_root_fails() {
  let env = TestEnv::empty();

  assert_cmd::cargo::cargo_bin_cmd!("batchmake")
    .arg("--root")
    .arg(env.temp.path().join("missing"))
    .arg("make")
    .env_remove("BATCHMAKE_CONFIG")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Failed to discover targets"));
}

#[test]
fn make_uses_configured_param_var_and_default() {
  let env = TestEnv::with_targets(&["a"]);
  env.write_file(
    "tree/batchmake.toml",
    r#"
param_var = "BOARD"
default_param = "rpi4"
command = ["/bin/sh", "-c", 'echo "$BOARD" >> "$BM_LOG"']
"#,
  );

  env.bm_cmd().arg("make").assert().success();

  assert_eq!(env.build_log(), vec!["rpi4"]);
}

/// Build command whose first target sends Ctrl-C to batchmake, then keeps running.
const INTERRUPTING_CONFIG: &str = r#"
command = ["/bin/sh", "-c", 'echo "$(basename "$PWD")" >> "$BM_LOG"; sleep 0.3; kill -INT $PPID; sleep 5']
"#;

#[test]
fn interrupt_exits_130_without_building_later_targets() {
  let env = TestEnv::with_targets(&["a", "b", "c"]);
  env.write_file("tree/batchmake.toml", INTERRUPTING_CONFIG);

  env
    .bm_cmd()
    .arg("make")
    .timeout(std::time::Duration::from_secs(4))
    .assert()
    .code(130)
    .stderr(predicate::str::contains("interrupted in"));

  assert_eq!(env.build_log(), vec!["a"]);
}

#[test]
fn interrupt_stops_a_keep_going_run() {
  let env = TestEnv::with_targets(&["a", "b", "c"]);
  env.write_file("tree/batchmake.toml", INTERRUPTING_CONFIG);

  env
    .bm_cmd()
    .arg("make")
    .arg("--keep-going")
    .timeout(std::time::Duration::from_secs(4))
    .assert()
    .code(130);

  assert_eq!(env.build_log(), vec!["a"]);
}
