use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn list_shows_targets_sorted() {
  let env = TestEnv::with_targets(&["02_runtime_init", "01_wait_forever"]);
  env.write_file("tree/02_runtime_init/target/debug/Cargo.toml", "");

  env
    .bm_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::is_match("01_wait_forever[\\s\\S]*02_runtime_init").unwrap())
    .stdout(predicate::str::contains("target/debug").not());
}

#[test]
fn list_empty_tree_reports_nothing_found() {
  let env = TestEnv::empty();

  env
    .bm_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("No directories containing Cargo.toml"));
}

#[test]
fn list_json_is_valid() {
  let env = TestEnv::with_targets(&["a", "b"]);

  let output = env.bm_cmd().args(["-o", "json", "list"]).assert().success().get_output().clone();

  let targets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(targets[0]["name"], "a");
  assert_eq!(targets[1]["name"], "b");
}

#[test]
fn list_honours_configured_marker() {
  let env = TestEnv::with_targets(&["a"]);
  env.write_file("tree/batchmake.toml", "marker = \"Makefile\"\n");
  env.write_file("tree/kernel/Makefile", "all:\n");

  env
    .bm_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("kernel"))
    .stdout(predicate::str::contains(" a\n").not());
}

#[test]
fn invalid_config_fails() {
  let env = TestEnv::with_targets(&["a"]);
  env.write_file("tree/batchmake.toml", "marker = [");

  env
    .bm_cmd()
    .arg("list")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Failed to load configuration"));
}
