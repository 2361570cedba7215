/// File whose presence marks a directory as a build target.
pub const DEFAULT_MARKER: &str = "Cargo.toml";

/// Environment variable the build parameter is exported under.
pub const DEFAULT_PARAM_VAR: &str = "BSP";

/// Board used when no parameter is given on the command line.
pub const DEFAULT_PARAM: &str = "rpi3";

pub const DEFAULT_BUILD_COMMAND: &[&str] = &["make"];

/// Directory names never descended into during discovery.
pub const DEFAULT_EXCLUDE: &[&str] = &["target", ".git"];

pub const CONFIG_FILE_NAME: &str = "batchmake.toml";

/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "BATCHMAKE_CONFIG";
