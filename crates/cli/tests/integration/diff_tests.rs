use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn identical_trees_succeed() {
  let env = TestEnv::empty();
  env.write_file("left/src/main.rs", "fn main() {}");
  env.write_file("right/src/main.rs", "fn main() {}");

  env
    .bm_cmd()
    .arg("diff")
    .arg(env.temp.path().join("left"))
    .arg(env.temp.path().join("right"))
    .assert()
    .success()
    .stdout(predicate::str::contains("identical"));
}

#[test]
fn differing_trees_fail_and_list_paths() {
  let env = TestEnv::empty();
  env.write_file("left/src/main.rs", "fn main() {}");
  env.write_file("right/src/main.rs", "fn main() { loop {} }");
  env.write_file("right/src/extra.rs", "");

  env
    .bm_cmd()
    .arg("diff")
    .arg(env.temp.path().join("left"))
    .arg(env.temp.path().join("right"))
    .assert()
    .code(1)
    .stdout(predicate::str::contains("+ src/extra.rs"))
    .stdout(predicate::str::contains("~ src/main.rs"))
    .stderr(predicate::str::contains("2 differences found"));
}
