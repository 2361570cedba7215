use predicates::prelude::*;

use super::common::TestEnv;

const PUBLISH_CONFIG: &str = r#"
[[publish]]
name = "clean"
each = ["/bin/sh", "-c", 'echo "clean $(basename "$PWD")" >> "$BM_LOG"']

[[publish]]
name = "make"
each = ["/bin/sh", "-c", 'echo "make $(basename "$PWD") $BSP" >> "$BM_LOG"; [ ! -e fail ] || exit 2']

[[publish]]
name = "spell"
shell = ["/bin/sh", "-c", 'echo "spell" >> "$BM_LOG"']
"#;

fn publish_env(names: &[&str]) -> TestEnv {
  let env = TestEnv::with_targets(names);
  env.write_file("tree/batchmake.toml", PUBLISH_CONFIG);
  env
}

#[test]
fn publish_runs_all_steps() {
  let env = publish_env(&["a", "b"]);

  env
    .bm_cmd()
    .arg("publish")
    .arg("rpi4")
    .assert()
    .success()
    .stdout(predicate::str::contains("Ready for publish: 3 steps passed"));

  assert_eq!(
    env.build_log(),
    vec!["clean a", "clean b", "make a rpi4", "make b rpi4", "spell"]
  );
}

#[test]
fn publish_stops_at_failed_step() {
  let env = publish_env(&["a", "b"]);
  env.fail_target("a");

  env
    .bm_cmd()
    .arg("publish")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Step make failed: target a exited with code 2"));

  assert_eq!(env.build_log(), vec!["clean a", "clean b", "make a rpi3"]);
}

#[test]
fn publish_json_lists_skipped_steps() {
  let env = publish_env(&["a"]);
  env.fail_target("a");

  let output = env
    .bm_cmd()
    .args(["-o", "json", "publish"])
    .assert()
    .code(1)
    .get_output()
    .clone();

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["completed"][0], "clean");
  assert_eq!(report["failed"][0], "make");
  assert_eq!(report["skipped"][0], "spell");
}

#[test]
fn publish_rejects_ambiguous_step() {
  let env = TestEnv::with_targets(&["a"]);
  env.write_file(
    "tree/batchmake.toml",
    "[[publish]]\nname = \"odd\"\neach = [\"true\"]\nshell = [\"true\"]\n",
  );

  env
    .bm_cmd()
    .arg("publish")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Invalid publish steps"));
}
